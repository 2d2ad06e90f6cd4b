/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod host;
mod upstream;

mod auth;
mod proxy;

pub use auth::{HttpAuth, HttpBasicAuth};
pub use host::Host;
pub use proxy::{HttpProxy, ProxyParseError};
pub use upstream::UpstreamAddr;
