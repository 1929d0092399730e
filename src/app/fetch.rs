// src/app/fetch.rs
use std::time::Duration;

use reqwest::blocking::Client;

use crate::app::metadata::MetadataDocument;
use crate::app::types::Item;
use crate::error::GalleryError;

/// Source of per-item metadata documents. The indexer and the overlay both go
/// through this, so tests can swap the network out.
pub trait MetadataFetcher: Send + Sync {
    fn fetch(&self, item: &Item) -> Result<MetadataDocument, GalleryError>;
}

/// Route `target` through the same-origin proxy when one is configured.
pub fn proxied_url(proxy_endpoint: Option<&str>, target: &str) -> String {
    match proxy_endpoint {
        Some(proxy) => {
            let sep = if proxy.contains('?') { '&' } else { '?' };
            format!("{proxy}{sep}url={}", urlencoding::encode(target))
        }
        None => target.to_string(),
    }
}

pub struct HttpFetcher {
    client: Client,
    proxy_endpoint: Option<String>,
}

impl HttpFetcher {
    pub fn new(proxy_endpoint: Option<String>) -> Result<Self, GalleryError> {
        let client = Client::builder()
            .user_agent("apegal/metadata")
            .timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(4)
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(ACCEPT, HeaderValue::from_static("application/json"));
                h
            })
            .build()
            .map_err(|e| GalleryError::Client(e.to_string()))?;
        Ok(Self {
            client,
            proxy_endpoint,
        })
    }
}

impl MetadataFetcher for HttpFetcher {
    fn fetch(&self, item: &Item) -> Result<MetadataDocument, GalleryError> {
        let url = proxied_url(self.proxy_endpoint.as_deref(), &item.metadata_url);
        let bytes = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| GalleryError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        MetadataDocument::from_slice(&bytes).map_err(|e| GalleryError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::proxied_url;

    #[test]
    fn direct_fetch_without_proxy() {
        assert_eq!(proxied_url(None, "https://ar.io/tx/1"), "https://ar.io/tx/1");
    }

    #[test]
    fn proxy_gets_encoded_target() {
        assert_eq!(
            proxied_url(Some("http://localhost:3001/api/proxy"), "https://ar.io/a?b=1&c=2"),
            "http://localhost:3001/api/proxy?url=https%3A%2F%2Far.io%2Fa%3Fb%3D1%26c%3D2"
        );
        assert_eq!(
            proxied_url(Some("http://h/p?k=v"), "https://x/1.json"),
            "http://h/p?k=v&url=https%3A%2F%2Fx%2F1.json"
        );
    }
}
