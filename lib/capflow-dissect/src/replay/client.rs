/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::pin::Pin;

use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use tokio::io::{AsyncBufRead, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

use capflow_types::net::{HttpAuth, HttpProxy, UpstreamAddr};

use super::{ReplayConfig, ReplayError};
use crate::http::HttpRequestHead;
use crate::{HttpStatusLine, LimitedBufReadExt};

/// An immutable replay client bound to one proxy configuration.
///
/// The replay tunnels through the proxy with an HTTP CONNECT request, does
/// a TLS handshake to the captured host and reissues the reconstructed
/// request there, reading back no more than the response head.
pub(super) struct HttpReplayClient {
    config: ReplayConfig,
    proxy: HttpProxy,
    tls: SslConnector,
}

impl HttpReplayClient {
    pub(super) fn new(config: &ReplayConfig) -> Result<Self, ReplayError> {
        let Some(url) = config.proxy.as_ref() else {
            return Err(ReplayError::NoProxyConfigured);
        };
        let proxy = HttpProxy::try_from(url)?;

        let mut builder = SslConnector::builder(SslMethod::tls_client())?;
        if !config.tls_verify {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(HttpReplayClient {
            config: config.clone(),
            proxy,
            tls: builder.build(),
        })
    }

    pub(super) fn built_from(&self, config: &ReplayConfig) -> bool {
        self.config.eq(config)
    }

    pub(super) async fn replay(
        &self,
        head: &HttpRequestHead,
        body: &[u8],
    ) -> Result<(), ReplayError> {
        match tokio::time::timeout(self.config.timeout, self.run(head, body)).await {
            Ok(r) => r,
            Err(_) => Err(ReplayError::TimedOut(self.config.timeout)),
        }
    }

    async fn run(&self, head: &HttpRequestHead, body: &[u8]) -> Result<(), ReplayError> {
        let Some(host) = &head.host else {
            return Err(ReplayError::NoHostHeader);
        };
        // the captured target is not reusable as is, rebuild it from the
        // host header with the scheme forced to https
        let port = match host.port() {
            0 => 443,
            p => p,
        };

        let peer = self.proxy.peer();
        let stream = TcpStream::connect((peer.host_str(), peer.port()))
            .await
            .map_err(ReplayError::ConnectFailed)?;

        let mut buf_stream = BufReader::new(stream);
        self.send_connect_request(&mut buf_stream, host, port)
            .await?;
        let (code, reason) =
            recv_response_head(&mut buf_stream, self.config.rsp_head_max_size).await?;
        if !(200..300).contains(&code) {
            return Err(ReplayError::ProxyDenied(code, reason));
        }

        // anything the proxy buffered past the tunnel response is dropped
        let stream = buf_stream.into_inner();
        let mut tls_stream = self.tls_connect(host, stream)?;
        Pin::new(&mut tls_stream)
            .connect()
            .await
            .map_err(ReplayError::TlsHandshakeFailed)?;

        tls_stream
            .write_all(&head.serialize())
            .await
            .map_err(ReplayError::WriteFailed)?;
        tls_stream
            .write_all(body)
            .await
            .map_err(ReplayError::WriteFailed)?;

        // read the response head for the side effect only, the body is
        // discarded unread when the connection drops
        let mut buf_stream = BufReader::new(tls_stream);
        let _ = recv_response_head(&mut buf_stream, self.config.rsp_head_max_size).await?;
        Ok(())
    }

    async fn send_connect_request<S>(
        &self,
        stream: &mut BufReader<S>,
        host: &UpstreamAddr,
        port: u16,
    ) -> Result<(), ReplayError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let target = UpstreamAddr::new(host.host().clone(), port).to_string();
        let mut req = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
        if let HttpAuth::Basic(basic) = &self.proxy.auth {
            req.push_str("Proxy-Authorization: Basic ");
            req.push_str(basic.encoded_value());
            req.push_str("\r\n");
        }
        req.push_str("\r\n");
        stream
            .get_mut()
            .write_all(req.as_bytes())
            .await
            .map_err(ReplayError::WriteFailed)
    }

    fn tls_connect(
        &self,
        host: &UpstreamAddr,
        stream: TcpStream,
    ) -> Result<SslStream<TcpStream>, ReplayError> {
        let mut conf = self.tls.configure()?;
        if !self.config.tls_verify {
            conf.set_verify_hostname(false);
        }
        let ssl = conf.into_ssl(&host.host_str())?;
        SslStream::new(ssl, stream).map_err(ReplayError::TlsSetupFailed)
    }
}

/// Read a response head, returning its status code and reason. All header
/// lines are consumed and ignored.
async fn recv_response_head<R>(
    reader: &mut R,
    max_header_size: usize,
) -> Result<(u16, String), ReplayError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line_buf = Vec::<u8>::with_capacity(1024);
    let mut header_size: usize = 0;

    let (found, nr) = reader
        .limited_read_until(b'\n', max_header_size, &mut line_buf)
        .await
        .map_err(ReplayError::ReadFailed)?;
    if nr == 0 {
        return Err(ReplayError::RemoteClosed);
    }
    if !found {
        return if nr < max_header_size {
            Err(ReplayError::RemoteClosed)
        } else {
            Err(ReplayError::TooLargeResponseHeader(max_header_size))
        };
    }
    header_size += nr;

    let status =
        HttpStatusLine::parse(line_buf.as_ref()).map_err(ReplayError::InvalidResponseLine)?;
    let code = status.code;
    let reason = status.reason.to_string();

    loop {
        if header_size >= max_header_size {
            return Err(ReplayError::TooLargeResponseHeader(max_header_size));
        }
        line_buf.clear();
        let max_len = max_header_size - header_size;
        let (found, nr) = reader
            .limited_read_until(b'\n', max_len, &mut line_buf)
            .await
            .map_err(ReplayError::ReadFailed)?;
        if nr == 0 {
            return Err(ReplayError::RemoteClosed);
        }
        if !found {
            return if nr < max_len {
                Err(ReplayError::RemoteClosed)
            } else {
                Err(ReplayError::TooLargeResponseHeader(max_header_size))
            };
        }
        header_size += nr;
        if (line_buf.len() == 1 && line_buf[0] == b'\n')
            || (line_buf.len() == 2 && line_buf[0] == b'\r' && line_buf[1] == b'\n')
        {
            // header end line
            break;
        }
    }

    Ok((code, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn recv_tunnel_established() {
        let stream = Builder::new()
            .read(b"HTTP/1.1 200 Connection established\r\nVia: test\r\n\r\n")
            .build();
        let mut reader = BufReader::new(stream);
        let (code, reason) = recv_response_head(&mut reader, 1024).await.unwrap();
        assert_eq!(code, 200);
        assert_eq!(reason, "Connection established");
    }

    #[tokio::test]
    async fn recv_denied() {
        let stream = Builder::new().read(b"HTTP/1.1 403 Forbidden\r\n\r\n").build();
        let mut reader = BufReader::new(stream);
        let (code, _) = recv_response_head(&mut reader, 1024).await.unwrap();
        assert_eq!(code, 403);
    }

    #[tokio::test]
    async fn recv_closed_early() {
        let stream = Builder::new().read(b"HTTP/1.1 200 OK\r\nVia: test").build();
        let mut reader = BufReader::new(stream);
        let err = recv_response_head(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, ReplayError::RemoteClosed));
    }

    #[tokio::test]
    async fn recv_oversized() {
        let mut data = b"HTTP/1.1 200 OK\r\nX-Fill: ".to_vec();
        data.resize(4096, b'a');
        let stream = Builder::new().read(&data).build();
        let mut reader = BufReader::new(stream);
        let err = recv_response_head(&mut reader, 128).await.unwrap_err();
        assert!(matches!(err, ReplayError::TooLargeResponseHeader(128)));
    }
}
