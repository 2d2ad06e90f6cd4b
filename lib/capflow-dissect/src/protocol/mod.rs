/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use async_trait::async_trait;
use thiserror::Error;

use crate::http::HttpRequestParseError;
use crate::replay::ReplayProxy;

mod registry;
pub use registry::ParserRegistry;

/// The role a captured packet plays in its flow.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PacketType {
    Request,
    Response,
}

/// Wire-protocol classification of a reconstructor. The set is closed:
/// the capture pipeline dispatches to exactly these slots.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParserType {
    HttpRequest,
    HttpResponse,
    WebSocket,
}

impl ParserType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParserType::HttpRequest => "http_request",
            ParserType::HttpResponse => "http_response",
            ParserType::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid http request: {0}")]
    InvalidHttpRequest(#[from] HttpRequestParseError),
    #[error("write to buffer failed: {0}")]
    BufWriteFailed(#[from] io::Error),
    #[error("message head not received yet")]
    NotReady,
}

/// Capability contract every protocol reconstructor satisfies.
///
/// The pipeline drives one instance per flow: feed fragments with
/// [`write`](Self::write), poll [`is_done`](Self::is_done), render with
/// [`display`](Self::display), then [`reset`](Self::reset) before handing
/// the instance to the next flow. A single instance is not safe for
/// concurrent use; all calls for one flow must be serialized.
#[async_trait]
pub trait ProtocolParser {
    fn name(&self) -> &'static str;

    fn packet_type(&self) -> PacketType;

    fn parser_type(&self) -> ParserType;

    /// Append one captured fragment. Bytes must arrive in stream order.
    fn write(&mut self, data: &[u8]) -> Result<usize, ParserError>;

    /// Whether the message is logically complete. No side effects.
    fn is_done(&self) -> bool;

    /// Return to the freshly-constructed state, keeping allocations.
    fn reset(&mut self);

    /// Produce the display dump, optionally replaying through `proxy` first.
    async fn display(&mut self, proxy: &ReplayProxy) -> Result<Vec<u8>, ParserError>;
}

pub type BoxProtocolParser = Box<dyn ProtocolParser + Send>;
