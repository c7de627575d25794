use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::endpoint::EndpointBuilder;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::{FetchOrchestrator, Fetcher};
use crate::normalizer::Normalizer;
use crate::scroll::{ScrollScheduler, Viewport};
use crate::search::SearchController;

pub struct AppContext {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub endpoints: EndpointBuilder,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.api)?);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let endpoints = EndpointBuilder::new(&config.api)?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            endpoints,
        })
    }

    pub fn orchestrator(&self) -> FetchOrchestrator {
        FetchOrchestrator::new(self.fetcher.clone(), self.endpoints.clone(), Normalizer::new())
    }

    /// A search controller whose auto-scroll drives `viewport`.
    pub fn search_controller(&self, viewport: Arc<dyn Viewport>) -> SearchController {
        let scheduler = ScrollScheduler::new(viewport, self.config.scroll.clone());
        SearchController::new(self.orchestrator(), scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tags;

    #[test]
    fn test_context_uses_configured_api() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9/index.php".to_string();
        config.api.relays.clear();

        let ctx = AppContext::new(config).unwrap();
        let candidates = ctx.endpoints.build(&Tags::parse("fox").unwrap());

        assert_eq!(candidates.len(), 1);
        assert!(candidates.direct().starts_with("http://127.0.0.1:9/index.php?"));
    }

    #[test]
    fn test_context_rejects_invalid_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();

        assert!(AppContext::new(config).is_err());
    }
}
