use std::sync::Arc;

use crate::app::{Result, TagscrollError};
use crate::domain::{Post, Tags};
use crate::endpoint::{EndpointBuilder, EndpointCandidates};
use crate::fetcher::{Fetcher, TransportFailure};
use crate::normalizer::Normalizer;
use crate::response::{detect_api_error, parse_response, ApiRejection};

/// Outcome of trying a single endpoint candidate.
#[derive(Debug)]
pub enum Attempt {
    Posts(Vec<Post>),
    Transport(TransportFailure),
    Rejected(ApiRejection),
}

/// Tries endpoint candidates one after another until one yields posts.
///
/// Transport failures move on to the next candidate. An explicit rejection by
/// the API stops immediately: it is about the query, not the path it took.
pub struct FetchOrchestrator {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    endpoints: EndpointBuilder,
    normalizer: Normalizer,
}

impl FetchOrchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        endpoints: EndpointBuilder,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            normalizer,
        }
    }

    pub fn endpoints(&self) -> &EndpointBuilder {
        &self.endpoints
    }

    pub async fn fetch_posts(&self, tags: &Tags) -> Result<Vec<Post>> {
        let candidates = self.endpoints.build(tags);
        self.fetch_candidates(&candidates).await
    }

    pub async fn fetch_candidates(&self, candidates: &EndpointCandidates) -> Result<Vec<Post>> {
        let mut last_failure = None;

        for (index, url) in candidates.iter().enumerate() {
            tracing::debug!("Trying endpoint {}/{}: {}", index + 1, candidates.len(), url);

            match self.attempt(url).await {
                Attempt::Posts(posts) => {
                    tracing::info!("Fetched {} posts from endpoint {}", posts.len(), index + 1);
                    return Ok(posts);
                }
                Attempt::Rejected(rejection) => {
                    tracing::info!("{}", rejection);
                    return Err(TagscrollError::ApiRejected(rejection));
                }
                Attempt::Transport(failure) => {
                    tracing::warn!("Endpoint {} failed ({}): {}", index + 1, url, failure);
                    last_failure = Some(failure);
                }
            }
        }

        Err(TagscrollError::EndpointsExhausted {
            attempts: candidates.len(),
            last: last_failure
                .unwrap_or_else(|| TransportFailure::Request("no endpoints".to_string())),
        })
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(TransportFailure::Request(e.to_string())),
        };

        let payload = match parse_response(&response) {
            Ok(payload) => payload,
            Err(failure) => return Attempt::Transport(failure),
        };

        if let Some(rejection) = detect_api_error(&payload) {
            return Attempt::Rejected(rejection);
        }

        Attempt::Posts(self.normalizer.normalize(&payload))
    }
}
