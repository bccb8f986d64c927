use std::sync::Arc;

use crate::config::Config;
use crate::series::SeriesFeeds;
use crate::signals::{self, SignalDefinition};

/// Read-only view shared by every handler. The poller keeps the write side.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub definitions: Arc<Vec<SignalDefinition>>,
    pub feeds: SeriesFeeds,
}

impl AppState {
    pub fn new(config: Config, feeds: SeriesFeeds) -> Self {
        let definitions = signals::definitions(&config);

        Self {
            config: Arc::new(config),
            definitions: Arc::new(definitions),
            feeds,
        }
    }
}
