/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;

use super::{BoxProtocolParser, ParserType};

type ParserFactory = Box<dyn Fn() -> BoxProtocolParser + Send + Sync>;

/// Factory table for protocol reconstructors, keyed by classification.
///
/// Built by the pipeline at startup; each parser module registers an
/// explicit factory call here, so there is no load-time global state.
#[derive(Default)]
pub struct ParserRegistry {
    inner: HashMap<ParserType, ParserFactory>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry {
            inner: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, parser_type: ParserType, factory: F)
    where
        F: Fn() -> BoxProtocolParser + Send + Sync + 'static,
    {
        if let Some(_old_factory) = self.inner.insert(parser_type, Box::new(factory)) {}
    }

    /// Build a fresh reconstructor for the given classification.
    pub fn build(&self, parser_type: ParserType) -> Option<BoxProtocolParser> {
        self.inner.get(&parser_type).map(|factory| factory())
    }

    pub fn contains(&self, parser_type: ParserType) -> bool {
        self.inner.contains_key(&parser_type)
    }

    pub fn registered_types(&self) -> Vec<ParserType> {
        self.inner.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpRequest;
    use crate::protocol::ProtocolParser;

    #[test]
    fn register_and_build() {
        let mut registry = ParserRegistry::new();
        registry.register(ParserType::HttpRequest, || {
            Box::new(HttpRequest::with_default_config())
        });

        assert!(registry.contains(ParserType::HttpRequest));
        assert!(!registry.contains(ParserType::WebSocket));
        assert_eq!(registry.registered_types(), vec![ParserType::HttpRequest]);

        let mut parser = registry.build(ParserType::HttpRequest).unwrap();
        assert_eq!(parser.parser_type(), ParserType::HttpRequest);
        assert!(!parser.is_done());
        let data = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let nr = parser.write(data).unwrap();
        assert_eq!(nr, data.len());
        assert!(parser.is_done());

        assert!(registry.build(ParserType::HttpResponse).is_none());
    }
}
