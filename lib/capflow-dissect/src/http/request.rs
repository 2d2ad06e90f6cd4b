/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::Write;
use std::str::FromStr;

use bytes::BufMut;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, Version};

use capflow_types::net::UpstreamAddr;

use super::{HttpBodyType, HttpRequestParseError};
use crate::{HttpHeaderLine, HttpLineParseError, HttpMethodLine};

/// Structured form of a captured request head.
///
/// Headers are kept in arrival order in a single map, as the dump should
/// carry everything the client sent, hop-by-hop fields included.
pub struct HttpRequestHead {
    pub version: Version,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// from the Host header, the port may be 0
    pub host: Option<UpstreamAddr>,
    content_length: u64,
    chunked_transfer: bool,
    has_transfer_encoding: bool,
    has_content_length: bool,
    has_trailer: bool,
}

impl HttpRequestHead {
    fn new(method: Method, uri: Uri, version: Version) -> Self {
        HttpRequestHead {
            version,
            method,
            uri,
            headers: HeaderMap::new(),
            host: None,
            content_length: 0,
            chunked_transfer: false,
            has_transfer_encoding: false,
            has_content_length: false,
            has_trailer: false,
        }
    }

    /// Try to parse a request head from the start of `buf`.
    ///
    /// Returns `Ok(None)` if the bytes so far are a valid prefix but the
    /// header block is not terminated yet; the caller should accumulate
    /// more data and retry. On success the returned usize is the size of
    /// the header block including the final empty line.
    pub fn parse(
        buf: &[u8],
        max_header_size: usize,
    ) -> Result<Option<(Self, usize)>, HttpRequestParseError> {
        let Some(line_end) = memchr::memchr(b'\n', buf) else {
            return if buf.len() >= max_header_size {
                Err(HttpRequestParseError::TooLargeHeader(max_header_size))
            } else {
                Ok(None)
            };
        };
        if line_end >= max_header_size {
            return Err(HttpRequestParseError::TooLargeHeader(max_header_size));
        }

        let mut req = HttpRequestHead::build_from_method_line(&buf[0..=line_end])?;
        if req.version == Version::HTTP_2 {
            // the connection preface of a prior-knowledge h2 flow, no
            // header block follows and the payload stays unparsed
            return Ok(Some((req, line_end + 1)));
        }

        let mut offset = line_end + 1;
        loop {
            if offset >= max_header_size {
                return Err(HttpRequestParseError::TooLargeHeader(max_header_size));
            }
            let left = &buf[offset..];
            let Some(line_end) = memchr::memchr(b'\n', left) else {
                return if buf.len() >= max_header_size {
                    Err(HttpRequestParseError::TooLargeHeader(max_header_size))
                } else {
                    Ok(None)
                };
            };
            let line = &left[0..=line_end];
            offset += line_end + 1;
            if (line.len() == 1 && line[0] == b'\n')
                || (line.len() == 2 && line[0] == b'\r' && line[1] == b'\n')
            {
                // header end line
                break;
            }

            let header =
                HttpHeaderLine::parse(line).map_err(HttpRequestParseError::InvalidHeaderLine)?;
            req.handle_header(header)?;
        }

        Ok(Some((req, offset)))
    }

    fn build_from_method_line(line_buf: &[u8]) -> Result<Self, HttpRequestParseError> {
        let line =
            HttpMethodLine::parse(line_buf).map_err(HttpRequestParseError::InvalidMethodLine)?;

        let version = match line.version {
            0 => Version::HTTP_10,
            1 => Version::HTTP_11,
            2 => Version::HTTP_2,
            _ => unreachable!(),
        };

        let method = Method::from_str(line.method)
            .map_err(|_| HttpRequestParseError::UnsupportedMethod(line.method.to_string()))?;
        let uri =
            Uri::from_str(line.uri).map_err(|_| HttpRequestParseError::InvalidRequestTarget)?;
        Ok(HttpRequestHead::new(method, uri, version))
    }

    fn handle_header(&mut self, header: HttpHeaderLine) -> Result<(), HttpRequestParseError> {
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;

        match name.as_str() {
            "host" => {
                if self.host.is_some() {
                    return Err(HttpRequestParseError::InvalidHost);
                }
                if !header.value.is_empty() {
                    let host = UpstreamAddr::from_str(header.value)
                        .map_err(|_| HttpRequestParseError::InvalidHost)?;
                    self.host = Some(host);
                }
            }
            "trailer" => {
                self.has_trailer = true;
            }
            "transfer-encoding" => {
                self.has_transfer_encoding = true;
                if self.has_content_length {
                    // transfer-encoding takes precedence, rfc9112 section 6.1
                    self.content_length = 0;
                }

                let v = header.value.to_lowercase();
                if v.ends_with("chunked") {
                    self.chunked_transfer = true;
                } else {
                    return Err(HttpRequestParseError::InvalidChunkedTransferEncoding);
                }
            }
            "content-length" => {
                if !self.has_transfer_encoding {
                    let content_length = u64::from_str(header.value)
                        .map_err(|_| HttpRequestParseError::InvalidContentLength)?;

                    if self.has_content_length && self.content_length != content_length {
                        return Err(HttpRequestParseError::InvalidContentLength);
                    }
                    self.has_content_length = true;
                    self.content_length = content_length;
                }
            }
            _ => {}
        }

        let value = HeaderValue::from_str(header.value).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    pub fn body_type(&self) -> Option<HttpBodyType> {
        if self.chunked_transfer {
            if self.has_trailer {
                Some(HttpBodyType::ChunkedWithTrailer)
            } else {
                Some(HttpBodyType::Chunked)
            }
        } else if self.content_length > 0 {
            Some(HttpBodyType::ContentLength(self.content_length))
        } else {
            None
        }
    }

    fn write_request_line(&self, buf: &mut Vec<u8>) {
        if let Some(pa) = self.uri.path_and_query() {
            let _ = write!(buf, "{} {} {:?}\r\n", self.method, pa, self.version);
        } else {
            let _ = write!(buf, "{} / {:?}\r\n", self.method, self.version);
        }
    }

    /// Serialize the head back to canonical wire format.
    ///
    /// Header names are emitted in lowercase and folded whitespace is
    /// gone, so the result is not byte-identical to the captured bytes.
    pub fn serialize(&self) -> Vec<u8> {
        const RESERVED_LEN_FOR_HEADERS: usize = 1024;
        let mut buf = Vec::<u8>::with_capacity(RESERVED_LEN_FOR_HEADERS);
        self.write_request_line(&mut buf);
        for (name, value) in self.headers.iter() {
            buf.put_slice(name.as_ref());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"\r\n");
        buf
    }
}
