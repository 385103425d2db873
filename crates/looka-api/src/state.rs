use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The HTTP client pools upstream connections across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}
