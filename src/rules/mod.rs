//! Persistence of the threshold rules.
//!
//! Two backends exist: a single Postgres row shared by every instance, and a
//! JSON slot on local disk. Both overwrite the whole rule set on save; there
//! is no partial-field update.

pub mod file;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::evaluation::ThresholdRules;

pub use file::FileRulesStore;
pub use postgres::PgRulesStore;

/// What [`RulesStore::load`] yields when nothing has been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub enum RulesFallback {
    /// Use this rule set until an operator saves one.
    Defaults(ThresholdRules),
    /// Report the rules as absent; the evaluator then meets no criteria.
    Absent,
}

impl RulesFallback {
    pub fn rules(&self) -> Option<ThresholdRules> {
        match self {
            Self::Defaults(rules) => Some(*rules),
            Self::Absent => None,
        }
    }
}

#[async_trait]
pub trait RulesStore: Send + Sync {
    /// Raw read. `Ok(None)` means no rules have ever been saved.
    async fn fetch(&self) -> Result<Option<ThresholdRules>>;

    /// Replace the stored rules with `rules`.
    async fn save(&self, rules: &ThresholdRules) -> Result<()>;

    /// Stored rules, or whatever `fallback` prescribes when none are saved.
    async fn load(&self, fallback: &RulesFallback) -> Result<Option<ThresholdRules>> {
        Ok(self.fetch().await?.or_else(|| fallback.rules()))
    }
}
