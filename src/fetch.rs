//! Coordinate fetching.
//!
//! The widget asks a [`CoordinateFetcher`] for the raw reply and classifies
//! it itself, so the single-request, no-retry policy lives in one place and a
//! fake fetcher can stand in for the network in tests. With the `http`
//! feature, [`HttpFetcher`] provides the reqwest-backed implementation, which
//! runs natively and on wasm32 (where reqwest uses the browser `fetch`).

use futures::future::LocalBoxFuture;

use crate::error::LoadError;

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// A `200 OK` reply.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body.into())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the one GET request a widget makes.
///
/// Implementations return `Err` only when no reply arrived at all; any HTTP
/// status, including errors, comes back as an [`HttpReply`].
pub trait CoordinateFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpReply, LoadError>>;
}

#[cfg(feature = "http")]
pub use self::http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use futures::future::{FutureExt, LocalBoxFuture};
    use log::{debug, info};
    use reqwest::Client;

    use super::{CoordinateFetcher, HttpReply};
    use crate::error::LoadError;

    #[cfg(not(target_arch = "wasm32"))]
    const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// reqwest-backed fetcher. Unauthenticated; in the browser the page's
    /// same-origin cookies ride along.
    pub struct HttpFetcher {
        client: Client,
    }

    impl HttpFetcher {
        pub fn new() -> Result<Self, LoadError> {
            let builder = Client::builder();

            #[cfg(not(target_arch = "wasm32"))]
            let builder = builder.timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS));

            let client = builder
                .build()
                .map_err(|e| LoadError::Request(format!("Failed to create HTTP client: {}", e)))?;

            Ok(Self { client })
        }

        async fn get(&self, url: &str) -> Result<HttpReply, LoadError> {
            info!("[HttpFetcher] Fetching coordinates from {}", url);

            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status().as_u16();
            let body = response.bytes().await?;
            debug!("[HttpFetcher] HTTP {} ({:.1}KB)", status, body.len() as f64 / 1024.0);

            Ok(HttpReply::new(status, body.to_vec()))
        }
    }

    impl CoordinateFetcher for HttpFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpReply, LoadError>> {
            self.get(url).boxed_local()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_success_range() {
        assert!(HttpReply::ok(b"{}".to_vec()).is_success());
        assert!(HttpReply::new(204, vec![]).is_success());
        assert!(!HttpReply::new(302, vec![]).is_success());
        assert!(!HttpReply::new(500, vec![]).is_success());
    }
}
