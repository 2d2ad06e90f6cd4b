/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::AsyncBufRead;

pub(crate) trait LimitedBufReadExt: AsyncBufRead {
    /// Read bytes into `buf` until `delimiter` is seen or `max_len` bytes
    /// have been consumed. Returns (delimiter found, bytes consumed).
    fn limited_read_until<'a>(
        &'a mut self,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadUntil<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadUntil::new(self, delimiter, max_len, buf)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedBufReadExt for R {}

pub(crate) struct LimitedReadUntil<'a, R: ?Sized> {
    reader: &'a mut R,
    delimiter: u8,
    read: usize,
    limit: usize,
    buf: &'a mut Vec<u8>,
}

impl<'a, R> LimitedReadUntil<'a, R>
where
    R: AsyncBufRead + ?Sized + Unpin,
{
    fn new(reader: &'a mut R, delimiter: u8, max_len: usize, buf: &'a mut Vec<u8>) -> Self {
        Self {
            reader,
            delimiter,
            read: 0,
            limit: max_len,
            buf,
        }
    }
}

fn read_until_internal<R: AsyncBufRead + ?Sized>(
    mut reader: Pin<&mut R>,
    cx: &mut Context<'_>,
    delimiter: u8,
    read: &mut usize,
    limit: usize,
    buf: &mut Vec<u8>,
) -> Poll<io::Result<(bool, usize)>> {
    loop {
        let (done, used) = {
            let available = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if available.is_empty() {
                // eof
                return Poll::Ready(Ok((false, mem::replace(read, 0))));
            }
            let room = limit - *read;
            match memchr::memchr(delimiter, available) {
                Some(i) if i < room => {
                    buf.extend_from_slice(&available[..=i]);
                    (true, i + 1)
                }
                _ => {
                    let len = available.len().min(room);
                    buf.extend_from_slice(&available[..len]);
                    (false, len)
                }
            }
        };
        reader.as_mut().consume(used);
        *read += used;
        if done {
            return Poll::Ready(Ok((true, mem::replace(read, 0))));
        }
        if *read >= limit {
            return Poll::Ready(Ok((false, mem::replace(read, 0))));
        }
    }
}

impl<R: AsyncBufRead + ?Sized + Unpin> Future for LimitedReadUntil<'_, R> {
    type Output = io::Result<(bool, usize)>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Self {
            reader,
            delimiter,
            read,
            limit,
            buf,
        } = &mut *self;
        read_until_internal(Pin::new(reader), cx, *delimiter, read, *limit, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn read_lines() {
        let mut reader = BufReader::new(&b"HTTP/1.1 200 OK\r\n\r\n"[..]);
        let mut line_buf = Vec::new();

        let (found, nr) = reader
            .limited_read_until(b'\n', 1024, &mut line_buf)
            .await
            .unwrap();
        assert!(found);
        assert_eq!(nr, 17);
        assert_eq!(line_buf.as_slice(), b"HTTP/1.1 200 OK\r\n");

        line_buf.clear();
        let (found, nr) = reader
            .limited_read_until(b'\n', 1024, &mut line_buf)
            .await
            .unwrap();
        assert!(found);
        assert_eq!(nr, 2);
    }

    #[tokio::test]
    async fn hit_limit() {
        let mut reader = BufReader::new(&b"0123456789abcdef\n"[..]);
        let mut line_buf = Vec::new();

        let (found, nr) = reader
            .limited_read_until(b'\n', 8, &mut line_buf)
            .await
            .unwrap();
        assert!(!found);
        assert_eq!(nr, 8);
        assert_eq!(line_buf.as_slice(), b"01234567");
    }

    #[tokio::test]
    async fn eof_before_delimiter() {
        let mut reader = BufReader::new(&b"partial"[..]);
        let mut line_buf = Vec::new();

        let (found, nr) = reader
            .limited_read_until(b'\n', 1024, &mut line_buf)
            .await
            .unwrap();
        assert!(!found);
        assert_eq!(nr, 7);
    }
}
