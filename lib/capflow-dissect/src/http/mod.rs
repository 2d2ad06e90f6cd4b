/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::Write;

use async_trait::async_trait;
use http::Version;

mod error;
pub use error::HttpRequestParseError;

mod request;
pub use request::HttpRequestHead;

mod body;
pub use body::HttpBodyType;
use body::scan_body_end;

use crate::protocol::{PacketType, ParserError, ParserType, ProtocolParser};
use crate::replay::ReplayProxy;
use crate::HttpMethodLine;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct H1ReassemblyConfig {
    pub head_max_size: usize,
}

impl Default for H1ReassemblyConfig {
    fn default() -> Self {
        H1ReassemblyConfig {
            head_max_size: 65536,
        }
    }
}

/// Incremental reconstructor for captured HTTP/1.x requests.
///
/// Fragments are appended to an accumulation buffer; the head is parsed as
/// soon as the header block is complete, and the message is flagged done
/// once the header semantics (content-length or chunked framing) say the
/// body has fully arrived. HTTP/2 flows are detected by their connection
/// preface and kept as raw bytes.
pub struct HttpRequest {
    config: H1ReassemblyConfig,
    packet_type: PacketType,
    buf: Vec<u8>,
    head: Option<HttpRequestHead>,
    head_size: usize,
    done: bool,
}

impl HttpRequest {
    pub fn new(config: H1ReassemblyConfig) -> Self {
        HttpRequest {
            config,
            packet_type: PacketType::Request,
            buf: Vec::new(),
            head: None,
            head_size: 0,
            done: false,
        }
    }

    pub fn with_default_config() -> Self {
        HttpRequest::new(H1ReassemblyConfig::default())
    }

    #[inline]
    pub fn head(&self) -> Option<&HttpRequestHead> {
        self.head.as_ref()
    }

    /// Probe whether `payload` starts like an HTTP/1.x request line,
    /// without touching any accumulation state.
    pub fn detect(payload: &[u8]) -> bool {
        let line = match memchr::memchr(b'\n', payload) {
            Some(p) => &payload[0..=p],
            None => payload,
        };
        HttpMethodLine::parse(line).is_ok()
    }

    fn body_bytes(&self) -> &[u8] {
        &self.buf[self.head_size..]
    }

    fn check_done(&mut self) -> Result<(), ParserError> {
        let Some(head) = &self.head else {
            return Ok(());
        };
        if head.version == Version::HTTP_2 {
            // framed payload, the capture layer owns the flow end
            return Ok(());
        }
        match head.body_type() {
            None => self.done = true,
            Some(body_type) => {
                let scanned = scan_body_end(self.body_bytes(), body_type)
                    .map_err(HttpRequestParseError::InvalidChunkedBody)?;
                if scanned.is_some() {
                    self.done = true;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProtocolParser for HttpRequest {
    fn name(&self) -> &'static str {
        "HTTPRequest"
    }

    fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    fn parser_type(&self) -> ParserType {
        ParserType::HttpRequest
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ParserError> {
        self.buf.write_all(data)?;

        if self.head.is_none() {
            match HttpRequestHead::parse(&self.buf, self.config.head_max_size)? {
                Some((head, head_size)) => {
                    self.head = Some(head);
                    self.head_size = head_size;
                }
                None => return Ok(data.len()),
            }
        }

        if !self.done {
            self.check_done()?;
        }
        Ok(data.len())
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn reset(&mut self) {
        self.done = false;
        self.head = None;
        self.head_size = 0;
        self.buf.clear();
    }

    async fn display(&mut self, proxy: &ReplayProxy) -> Result<Vec<u8>, ParserError> {
        let Some(head) = &self.head else {
            return Err(ParserError::NotReady);
        };

        if head.version == Version::HTTP_2 {
            return Ok(self.buf.clone());
        }

        if let Err(e) = proxy.replay(head, &self.buf[self.head_size..]).await {
            // the replay is a side channel probe, its failure never
            // suppresses the dump
            log::warn!("request replay failed: {e}");
        }

        let mut dump = head.serialize();
        dump.extend_from_slice(&self.buf[self.head_size..]);
        Ok(dump)
    }
}
