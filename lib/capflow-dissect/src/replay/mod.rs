/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use url::Url;

mod error;
pub use error::ReplayError;

mod client;
use client::HttpReplayClient;

use crate::http::HttpRequestHead;

const DEFAULT_REPLAY_TIMEOUT: Duration = Duration::from_secs(4);

/// Proxy settings for the replay side channel.
///
/// The settings are an operational knob, not per-flow state; equality is
/// what decides whether the cached replay client can be reused.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplayConfig {
    pub proxy: Option<Url>,
    /// the replay probes through interception setups, so verification is
    /// off unless asked for
    pub tls_verify: bool,
    pub timeout: Duration,
    pub rsp_head_max_size: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            proxy: None,
            tls_verify: false,
            timeout: DEFAULT_REPLAY_TIMEOUT,
            rsp_head_max_size: 4096,
        }
    }
}

/// Process wide replay forwarder, shared by all flows.
///
/// The inner client is immutable and swapped as a whole: a display call
/// loads the current config, and rebuilds the client only if the cached
/// one was built from different settings. The swap is a compare-and-swap,
/// so racing flows never hold a lock across network I/O; a loser just
/// adopts the winner's client.
pub struct ReplayProxy {
    config: ArcSwap<ReplayConfig>,
    client: ArcSwapOption<HttpReplayClient>,
}

impl ReplayProxy {
    pub fn new(config: ReplayConfig) -> Self {
        ReplayProxy {
            config: ArcSwap::from_pointee(config),
            client: ArcSwapOption::const_empty(),
        }
    }

    pub fn update_config(&self, config: ReplayConfig) {
        // the client is rebuilt lazily by the next replay call
        self.config.store(Arc::new(config));
    }

    fn fetch_client(
        &self,
        config: &ReplayConfig,
    ) -> Result<Option<Arc<HttpReplayClient>>, ReplayError> {
        if config.proxy.is_none() {
            return Ok(None);
        }

        let cached = self.client.load_full();
        if let Some(client) = &cached {
            if client.built_from(config) {
                return Ok(cached);
            }
        }

        let client = Arc::new(HttpReplayClient::new(config)?);
        let prev = self.client.compare_and_swap(&cached, Some(client.clone()));
        let prev_ptr = prev.as_ref().map(Arc::as_ptr);
        if prev_ptr == cached.as_ref().map(Arc::as_ptr) {
            return Ok(Some(client));
        }
        // another flow swapped first, reuse its client if it is current
        match prev.as_ref() {
            Some(winner) if winner.built_from(config) => Ok(Some(winner.clone())),
            _ => Ok(Some(client)),
        }
    }

    /// Reissue the reconstructed request through the configured proxy.
    ///
    /// A no-op when no proxy url is configured.
    pub async fn replay(&self, head: &HttpRequestHead, body: &[u8]) -> Result<(), ReplayError> {
        let config = self.config.load_full();
        let Some(client) = self.fetch_client(&config)? else {
            return Ok(());
        };
        client.replay(head, body).await
    }
}

impl Default for ReplayProxy {
    fn default() -> Self {
        ReplayProxy::new(ReplayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn no_proxy_is_a_noop() {
        let content = b"GET / HTTP/1.1\r\nHost: a.com\r\n\r\n";
        let (head, _) = HttpRequestHead::parse(content, 4096).unwrap().unwrap();

        let proxy = ReplayProxy::default();
        assert!(proxy.replay(&head, b"").await.is_ok());
    }

    #[tokio::test]
    async fn invalid_proxy_url_is_reported() {
        let content = b"GET / HTTP/1.1\r\nHost: a.com\r\n\r\n";
        let (head, _) = HttpRequestHead::parse(content, 4096).unwrap().unwrap();

        let proxy = ReplayProxy::new(ReplayConfig {
            proxy: Some(Url::from_str("socks5://127.0.0.1:1080").unwrap()),
            ..Default::default()
        });
        let err = proxy.replay(&head, b"").await.unwrap_err();
        assert!(matches!(err, ReplayError::InvalidProxy(_)));
    }

    #[tokio::test]
    async fn missing_host_is_reported() {
        let content = b"GET / HTTP/1.0\r\n\r\n";
        let (head, _) = HttpRequestHead::parse(content, 4096).unwrap().unwrap();

        let proxy = ReplayProxy::new(ReplayConfig {
            proxy: Some(Url::from_str("http://127.0.0.1:1").unwrap()),
            ..Default::default()
        });
        let err = proxy.replay(&head, b"").await.unwrap_err();
        assert!(matches!(err, ReplayError::NoHostHeader));
    }

    #[tokio::test]
    async fn client_rebuilt_on_config_change() {
        let proxy = ReplayProxy::new(ReplayConfig {
            proxy: Some(Url::from_str("http://127.0.0.1:1").unwrap()),
            ..Default::default()
        });

        let config = proxy.config.load_full();
        let first = proxy.fetch_client(&config).unwrap().unwrap();
        let again = proxy.fetch_client(&config).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        proxy.update_config(ReplayConfig {
            proxy: Some(Url::from_str("http://127.0.0.2:2").unwrap()),
            ..Default::default()
        });
        let config = proxy.config.load_full();
        let rebuilt = proxy.fetch_client(&config).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }
}
