/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use thiserror::Error;

use capflow_types::net::ProxyParseError;

use crate::HttpLineParseError;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("no proxy url configured")]
    NoProxyConfigured,
    #[error("invalid proxy url: {0}")]
    InvalidProxy(#[from] ProxyParseError),
    #[error("no host header in the captured request")]
    NoHostHeader,
    #[error("connect to proxy failed: {0}")]
    ConnectFailed(io::Error),
    #[error("proxy denied the tunnel request: {0} {1}")]
    ProxyDenied(u16, String),
    #[error("tls setup failed: {0}")]
    TlsSetupFailed(#[from] openssl::error::ErrorStack),
    #[error("tls handshake failed: {0}")]
    TlsHandshakeFailed(openssl::ssl::Error),
    #[error("write failed: {0}")]
    WriteFailed(io::Error),
    #[error("read failed: {0}")]
    ReadFailed(io::Error),
    #[error("peer closed the connection early")]
    RemoteClosed,
    #[error("invalid response line: {0}")]
    InvalidResponseLine(HttpLineParseError),
    #[error("too large response header, should be less than {0}")]
    TooLargeResponseHeader(usize),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}
