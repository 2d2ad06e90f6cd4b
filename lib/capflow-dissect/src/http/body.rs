/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::{HttpChunkedLine, HttpLineParseError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpBodyType {
    ContentLength(u64),
    Chunked,
    ChunkedWithTrailer,
}

/// Check whether the accumulated `body` bytes already hold a complete
/// message body of the given type.
///
/// Returns the end offset of the body once enough bytes are present, or
/// `Ok(None)` if more data is needed. Broken chunked framing is an error,
/// as it can never terminate.
pub(super) fn scan_body_end(
    body: &[u8],
    body_type: HttpBodyType,
) -> Result<Option<usize>, HttpLineParseError> {
    match body_type {
        HttpBodyType::ContentLength(len) => {
            if (body.len() as u64) < len {
                Ok(None)
            } else {
                Ok(Some(len as usize))
            }
        }
        HttpBodyType::Chunked => scan_chunked_end(body, false),
        HttpBodyType::ChunkedWithTrailer => scan_chunked_end(body, true),
    }
}

fn scan_chunked_end(body: &[u8], with_trailer: bool) -> Result<Option<usize>, HttpLineParseError> {
    let mut offset = 0usize;

    loop {
        let left = &body[offset..];
        let Some(line_end) = memchr::memchr(b'\n', left) else {
            return Ok(None);
        };
        let chunk = HttpChunkedLine::parse(&left[0..=line_end])?;
        offset += line_end + 1;

        if chunk.chunk_size == 0 {
            return if with_trailer {
                scan_trailer_end(body, offset)
            } else {
                // a final empty line closes the body
                match next_line_end(&body[offset..]) {
                    Some(n) => Ok(Some(offset + n)),
                    None => Ok(None),
                }
            };
        }

        // chunk data is followed by its own CRLF
        let data_end = offset as u64 + chunk.chunk_size;
        if (body.len() as u64) < data_end {
            return Ok(None);
        }
        offset = data_end as usize;
        match next_line_end(&body[offset..]) {
            Some(n) => offset += n,
            None => return Ok(None),
        }
    }
}

fn scan_trailer_end(body: &[u8], mut offset: usize) -> Result<Option<usize>, HttpLineParseError> {
    loop {
        let left = &body[offset..];
        let Some(line_end) = memchr::memchr(b'\n', left) else {
            return Ok(None);
        };
        let line = &left[0..=line_end];
        offset += line_end + 1;
        if (line.len() == 1 && line[0] == b'\n')
            || (line.len() == 2 && line[0] == b'\r' && line[1] == b'\n')
        {
            return Ok(Some(offset));
        }
    }
}

fn next_line_end(left: &[u8]) -> Option<usize> {
    memchr::memchr(b'\n', left).map(|p| p + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length() {
        let t = HttpBodyType::ContentLength(5);
        assert_eq!(scan_body_end(b"", t).unwrap(), None);
        assert_eq!(scan_body_end(b"hell", t).unwrap(), None);
        assert_eq!(scan_body_end(b"hello", t).unwrap(), Some(5));
    }

    #[test]
    fn chunked() {
        let t = HttpBodyType::Chunked;
        assert_eq!(scan_body_end(b"5\r\nhello\r\n", t).unwrap(), None);
        assert_eq!(scan_body_end(b"5\r\nhello\r\n0\r\n", t).unwrap(), None);

        let full = b"5\r\nhello\r\n0\r\n\r\n";
        assert_eq!(scan_body_end(full, t).unwrap(), Some(full.len()));
    }

    #[test]
    fn chunked_with_trailer() {
        let t = HttpBodyType::ChunkedWithTrailer;
        let no_end = b"5\r\nhello\r\n0\r\nX-Sum: abc\r\n";
        assert_eq!(scan_body_end(no_end, t).unwrap(), None);

        let full = b"5\r\nhello\r\n0\r\nX-Sum: abc\r\n\r\n";
        assert_eq!(scan_body_end(full, t).unwrap(), Some(full.len()));
    }

    #[test]
    fn chunked_broken() {
        assert!(scan_body_end(b"zz\r\n", HttpBodyType::Chunked).is_err());
    }
}
