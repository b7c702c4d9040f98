use std::sync::Arc;

use config::Config;
use middleware::RateLimiter;

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn cache::Store>) -> Self {
        let limiter = Arc::new(RateLimiter::new(store, &config));
        Self { config, limiter }
    }
}
