/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use anyhow::anyhow;
use url::Url;

use super::Host;

/// An upstream address as seen on the wire, e.g. in a Host header or a
/// proxy URL authority. The port may be 0 if the source didn't carry one.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host_str(&self) -> String {
        self.host.to_string()
    }

    fn from_host_str_and_port(host: &str, port: u16) -> anyhow::Result<Self> {
        let host = Host::from_str(host)?;
        Ok(UpstreamAddr { host, port })
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Ip(IpAddr::V6(ip6)) => write!(f, "[{ip6}]:{}", self.port),
            host => write!(f, "{host}:{}", self.port),
        }
    }
}

impl FromStr for UpstreamAddr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("empty string"));
        }
        if s.as_bytes()[0] == b'[' {
            // ipv6 in squared brackets, with optional port
            return match s.rfind(']') {
                Some(pos_last) => {
                    let host = &s[..=pos_last];
                    match s[pos_last + 1..].strip_prefix(':') {
                        Some(port_s) => {
                            let port =
                                u16::from_str(port_s).map_err(|_| anyhow!("invalid port"))?;
                            UpstreamAddr::from_host_str_and_port(host, port)
                        }
                        None if s.len() == pos_last + 1 => {
                            UpstreamAddr::from_host_str_and_port(host, 0)
                        }
                        None => Err(anyhow!("invalid characters after ipv6 brackets")),
                    }
                }
                None => Err(anyhow!("missing closing square bracket")),
            };
        }
        match memchr::memchr(b':', s.as_bytes()) {
            Some(_) if s.as_bytes().iter().filter(|c| **c == b':').count() > 1 => {
                // bare ipv6, no port part
                UpstreamAddr::from_host_str_and_port(s, 0)
            }
            Some(p) => {
                let port = u16::from_str(&s[p + 1..]).map_err(|_| anyhow!("invalid port"))?;
                UpstreamAddr::from_host_str_and_port(&s[..p], port)
            }
            None => UpstreamAddr::from_host_str_and_port(s, 0),
        }
    }
}

impl TryFrom<&Url> for UpstreamAddr {
    type Error = anyhow::Error;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        let host = url.host().ok_or_else(|| anyhow!("no host in url"))?;
        let port = url.port_or_known_default().unwrap_or(0);
        Ok(UpstreamAddr {
            host: Host::from(host.to_owned()),
            port,
        })
    }
}
