/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::HttpLineParseError;

pub struct HttpHeaderLine<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl<'a> HttpHeaderLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpHeaderLine<'a>, HttpLineParseError> {
        let Some(p) = memchr::memchr(b':', buf) else {
            return Err(HttpLineParseError::NoDelimiterFound(':'));
        };

        let name = std::str::from_utf8(&buf[0..p])?.trim();
        let value = std::str::from_utf8(&buf[p + 1..])?.trim();

        Ok(HttpHeaderLine { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple() {
        let header = HttpHeaderLine::parse(b"Host: example.com\r\n").unwrap();
        assert_eq!(header.name, "Host");
        assert_eq!(header.value, "example.com");
    }

    #[test]
    fn extra_space() {
        let header = HttpHeaderLine::parse(b"  Accept  :  */*  \r\n").unwrap();
        assert_eq!(header.name, "Accept");
        assert_eq!(header.value, "*/*");
    }

    #[test]
    fn no_delimiter() {
        assert!(HttpHeaderLine::parse(b"SM\r\n").is_err());
    }
}
