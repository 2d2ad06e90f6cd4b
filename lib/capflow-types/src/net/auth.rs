/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use base64::prelude::*;

pub struct HttpBasicAuth {
    pub username: String,
    pub password: String,
    encoded_value: String,
}

impl HttpBasicAuth {
    pub fn new(username: String, password: String) -> Self {
        let mut buf = Vec::with_capacity(username.len() + 1 + password.len());
        buf.extend_from_slice(username.as_bytes());
        buf.push(b':');
        buf.extend_from_slice(password.as_bytes());

        let encoded_value = BASE64_STANDARD.encode(buf);

        HttpBasicAuth {
            username,
            password,
            encoded_value,
        }
    }

    #[inline]
    pub fn encoded_value(&self) -> &str {
        &self.encoded_value
    }
}

#[derive(Default)]
pub enum HttpAuth {
    #[default]
    None,
    Basic(HttpBasicAuth),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_encoded() {
        let auth = HttpBasicAuth::new("aladdin".to_string(), "opensesame".to_string());
        assert_eq!(auth.encoded_value(), "YWxhZGRpbjpvcGVuc2VzYW1l");
    }
}
