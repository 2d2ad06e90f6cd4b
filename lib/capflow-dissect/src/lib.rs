/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod parse;
pub use parse::{
    HttpChunkedLine, HttpHeaderLine, HttpLineParseError, HttpMethodLine, HttpStatusLine,
};

mod io;
pub(crate) use io::LimitedBufReadExt;

pub mod http;
pub mod protocol;
pub mod replay;
