pub mod api;
pub mod config;
pub mod db;
pub mod evaluation;
pub mod forecast;
pub mod history;
pub mod observation_cache;
pub mod refresh;
pub mod response_store;
pub mod rules;

#[cfg(test)]
mod test_support;
