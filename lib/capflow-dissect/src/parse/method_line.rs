/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::HttpLineParseError;

pub struct HttpMethodLine<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub version: u8,
}

impl<'a> HttpMethodLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpMethodLine<'a>, HttpLineParseError> {
        const MINIMAL_LENGTH: usize = 13; // M / HTTP/1.0\n

        if buf.len() < MINIMAL_LENGTH {
            return Err(HttpLineParseError::NotLongEnough);
        }

        let Some(p) = memchr::memchr(b' ', buf) else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let method = std::str::from_utf8(&buf[0..p])?;

        let left = &buf[p + 1..];
        let Some(p) = memchr::memchr(b' ', left) else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let uri = std::str::from_utf8(&left[0..p])?.trim();

        let version = match std::str::from_utf8(&left[p + 1..])?.trim_end() {
            "HTTP/1.0" => 0,
            "HTTP/1.1" => 1,
            "HTTP/2.0" | "HTTP/2" => 2,
            _ => return Err(HttpLineParseError::InvalidVersion),
        };

        Ok(HttpMethodLine {
            method,
            uri,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_origin_form() {
        let line = HttpMethodLine::parse(b"GET /v/a/x HTTP/1.1\r\n").unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.uri, "/v/a/x");
        assert_eq!(line.version, 1);
    }

    #[test]
    fn h2_preface() {
        let line = HttpMethodLine::parse(b"PRI * HTTP/2.0\r\n").unwrap();
        assert_eq!(line.method, "PRI");
        assert_eq!(line.uri, "*");
        assert_eq!(line.version, 2);
    }

    #[test]
    fn invalid() {
        assert!(HttpMethodLine::parse(b"GET /\r\n").is_err());
        assert!(HttpMethodLine::parse(b"GET / HTTP/3.0\r\n").is_err());
        assert!(HttpMethodLine::parse(b"NOSPACEATALL\r\n\r\n").is_err());
    }
}
