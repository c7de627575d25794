//! Candidate request URLs for a tag search.
//!
//! The first candidate is always the direct API call. Every further candidate is
//! the same URL routed through a relay prefix, so a blocked or flaky direct path
//! can fall back to a relay without changing the logical request.

use url::Url;

use crate::app::Result;
use crate::domain::Tags;
use crate::fetcher::ApiConfig;

/// Ordered, non-empty list of URLs for one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidates {
    urls: Vec<String>,
}

impl EndpointCandidates {
    /// The unproxied API URL.
    pub fn direct(&self) -> &str {
        &self.urls[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false: the direct URL is always present.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    base: Url,
    limit: u32,
    relays: Vec<String>,
}

impl EndpointBuilder {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Url::parse(config.base_url.trim())?;
        let relays = config
            .relays
            .iter()
            .filter_map(|prefix| normalize_relay_prefix(prefix))
            .collect();

        Ok(Self {
            base,
            limit: config.limit,
            relays,
        })
    }

    pub fn build(&self, tags: &Tags) -> EndpointCandidates {
        let direct = self.direct_url(tags);

        let mut urls = Vec::with_capacity(self.relays.len() + 1);
        urls.push(direct.clone());
        urls.extend(self.relays.iter().map(|prefix| format!("{}{}", prefix, direct)));

        EndpointCandidates { urls }
    }

    fn direct_url(&self, tags: &Tags) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .extend_pairs(query_params(tags, self.limit));
        url.to_string()
    }
}

/// The fixed query parameters of a post search, in wire order.
pub fn query_params(tags: &Tags, limit: u32) -> [(&'static str, String); 6] {
    [
        ("page", "dapi".to_string()),
        ("s", "post".to_string()),
        ("q", "index".to_string()),
        ("json", "1".to_string()),
        ("limit", limit.to_string()),
        ("tags", tags.as_str().to_string()),
    ]
}

/// Relay prefixes must end in a separator so the appended URL stays intact.
fn normalize_relay_prefix(prefix: &str) -> Option<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return None;
    }
    if prefix.ends_with('/') || prefix.ends_with('?') || prefix.ends_with('=') {
        Some(prefix.to_string())
    } else {
        Some(format!("{}/", prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(relays: &[&str]) -> EndpointBuilder {
        let config = ApiConfig {
            relays: relays.iter().map(|r| r.to_string()).collect(),
            ..ApiConfig::default()
        };
        EndpointBuilder::new(&config).unwrap()
    }

    fn tags(s: &str) -> Tags {
        Tags::parse(s).unwrap()
    }

    #[test]
    fn test_direct_url_query() {
        let candidates = builder(&[]).build(&tags("cat_ears solo"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates.direct(),
            "https://api.rule34.xxx/index.php?page=dapi&s=post&q=index&json=1&limit=60&tags=cat_ears+solo"
        );
    }

    #[test]
    fn test_relays_follow_direct_in_order() {
        let candidates = builder(&["https://relay-a.example/?", "https://relay-b.example/raw?url="])
            .build(&tags("fox"));
        let urls: Vec<&str> = candidates.iter().collect();

        assert_eq!(urls.len(), 3);
        assert!(!urls[0].starts_with("https://relay"));
        assert_eq!(urls[1], format!("https://relay-a.example/?{}", urls[0]));
        assert_eq!(urls[2], format!("https://relay-b.example/raw?url={}", urls[0]));
    }

    #[test]
    fn test_every_candidate_carries_same_query() {
        let candidates = builder(&["https://relay.example/", "http://127.0.0.1:8000/relay"])
            .build(&tags("a b"));
        let direct = candidates.direct().to_string();
        let query = Url::parse(&direct).unwrap();
        let pairs: Vec<(String, String)> = query.query_pairs().into_owned().collect();

        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "dapi".to_string()),
                ("s".to_string(), "post".to_string()),
                ("q".to_string(), "index".to_string()),
                ("json".to_string(), "1".to_string()),
                ("limit".to_string(), "60".to_string()),
                ("tags".to_string(), "a b".to_string()),
            ]
        );
        for url in candidates.iter() {
            assert!(url.ends_with(&direct));
        }
    }

    #[test]
    fn test_relay_prefix_normalization() {
        assert_eq!(
            normalize_relay_prefix("http://127.0.0.1:8000/relay"),
            Some("http://127.0.0.1:8000/relay/".into())
        );
        assert_eq!(
            normalize_relay_prefix(" https://r.example/?url= "),
            Some("https://r.example/?url=".into())
        );
        assert_eq!(normalize_relay_prefix("   "), None);

        let candidates = builder(&["", "https://relay.example"]).build(&tags("x"));
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().nth(1).unwrap().starts_with("https://relay.example/https://"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let b = builder(&["https://relay.example/"]);
        assert_eq!(b.build(&tags("x y")), b.build(&tags("x y")));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        };
        assert!(EndpointBuilder::new(&config).is_err());
    }
}
