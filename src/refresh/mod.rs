mod service;

pub use service::{RefreshError, RefreshReport, RefreshService};
