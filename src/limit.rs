use crate::buf_reader::BufIo;
use crate::chunked::ChunkedDecoder;
use crate::Error;
use http::HeaderMap;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

/// Limit reading data given configuration from response headers.
pub(crate) enum LimitRead {
    /// Read from a chunked decoder. The decoder will know when there is no
    /// more data to be read.
    ChunkedDecoder(ChunkedDecoder),
    /// Body data is limited by a `content-length` header.
    ContentLength(ContentLengthRead),
    /// Read until the connection closes.
    ReadToEnd(ReadToEnd),
    /// No expected body.
    NoBody,
}

impl LimitRead {
    /// Create an instance from response headers.
    ///
    /// 1. A response to a `HEAD` request never has a body.
    /// 2. If header `transfer-encoding: chunked`, use a chunked decoder.
    /// 3. If header `content-length: <number>`, use a reader limited by length.
    /// 4. Otherwise read until the connection closes.
    pub fn from_headers(headers: &HeaderMap, is_head: bool) -> Self {
        // https://tools.ietf.org/html/rfc7230#page-31
        // If a message is received with both a Transfer-Encoding and a
        // Content-Length header field, the Transfer-Encoding overrides the
        // Content-Length.

        let ret = if is_head {
            LimitRead::NoBody
        } else if is_chunked(headers) {
            LimitRead::ChunkedDecoder(ChunkedDecoder::new())
        } else if let Some(size) = get_as::<u64>(headers, "content-length") {
            LimitRead::ContentLength(ContentLengthRead::new(size))
        } else {
            // https://tools.ietf.org/html/rfc1945#section-7.2.2
            // If a Content-Length header field is present, its value in
            // bytes represents the length of the Entity-Body. Otherwise,
            // the body length is determined by the closing of the
            // connection by the server.
            LimitRead::ReadToEnd(ReadToEnd::new())
        };

        trace!("LimitRead from headers: {:?}", ret);

        ret
    }

    pub fn is_complete(&self) -> bool {
        match self {
            LimitRead::ChunkedDecoder(v) => v.is_end(),
            LimitRead::ContentLength(v) => v.is_end(),
            LimitRead::ReadToEnd(v) => v.is_end(),
            LimitRead::NoBody => true,
        }
    }

    /// Whether the socket can go back to the pool once this body is done.
    /// A read-to-end body consumes the connection itself.
    pub fn is_reusable(&self) -> bool {
        self.is_complete() && !self.is_read_to_end()
    }

    fn is_read_to_end(&self) -> bool {
        matches!(self, LimitRead::ReadToEnd(_))
    }

    /// Try read some data.
    pub fn read<R: Read>(&mut self, recv: &mut BufIo<R>, buf: &mut [u8]) -> Result<usize, Error> {
        match self {
            LimitRead::ChunkedDecoder(v) => v.read(recv, buf),
            LimitRead::ContentLength(v) => v.read(recv, buf),
            LimitRead::ReadToEnd(v) => v.read(recv, buf),
            LimitRead::NoBody => Ok(0),
        }
    }
}

/// Reader limited by a set length.
#[derive(Debug)]
pub(crate) struct ContentLengthRead {
    limit: u64,
    total: u64,
}

impl ContentLengthRead {
    fn new(limit: u64) -> Self {
        ContentLengthRead { limit, total: 0 }
    }

    fn is_end(&self) -> bool {
        self.total == self.limit
    }

    fn read<R: Read>(&mut self, recv: &mut BufIo<R>, buf: &mut [u8]) -> Result<usize, Error> {
        assert!(!buf.is_empty(), "read with len 0 buf");

        let left = (self.limit - self.total).min(usize::MAX as u64) as usize;

        if left == 0 {
            // Nothing more should be read.
            return Ok(0);
        }

        let max = buf.len().min(left);
        let amount = recv.read(&mut buf[0..max])?;

        if amount == 0 {
            // https://tools.ietf.org/html/rfc7230#page-32
            // If the sender closes the connection or the recipient
            // times out before the indicated number of octets are
            // received, the recipient MUST consider the message to be
            // incomplete and close the connection.
            let msg = format!(
                "Partial body received {} bytes and expected {}",
                self.total, self.limit
            );
            trace!("{}", msg);
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, msg).into());
        }

        self.total += amount as u64;

        Ok(amount)
    }
}

pub(crate) struct ReadToEnd {
    reached_end: bool,
}

impl ReadToEnd {
    fn new() -> Self {
        ReadToEnd { reached_end: false }
    }

    fn is_end(&self) -> bool {
        self.reached_end
    }

    fn read<R: Read>(&mut self, recv: &mut BufIo<R>, buf: &mut [u8]) -> Result<usize, Error> {
        assert!(!buf.is_empty(), "read with len 0 buf");

        let amount = recv.read(buf)?;

        if amount == 0 {
            self.reached_end = true;
        }

        Ok(amount)
    }
}

impl fmt::Debug for LimitRead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LimitRead::ChunkedDecoder(_) => write!(f, "ChunkedDecoder")?,
            LimitRead::ContentLength(l) => write!(f, "ContentLength({})", l.limit)?,
            LimitRead::ReadToEnd(_) => write!(f, "ReadToEnd")?,
            LimitRead::NoBody => write!(f, "NoBody")?,
        }
        Ok(())
    }
}

fn is_chunked(headers: &HeaderMap) -> bool {
    get_str(headers, "transfer-encoding")
        .map(|h| h == "chunked")
        .unwrap_or(false)
}

/// Whether the response declares a gzip body.
pub(crate) fn is_gzip(headers: &HeaderMap) -> bool {
    get_str(headers, "content-encoding")
        .map(|h| h == "gzip")
        .unwrap_or(false)
}

/// Whether the response allows the connection to serve another request.
pub(crate) fn allow_reuse(headers: &HeaderMap, version: http::Version) -> bool {
    if version == http::Version::HTTP_11 {
        is_keep_alive(headers, true)
    } else {
        is_keep_alive(headers, false)
    }
}

fn is_keep_alive(headers: &HeaderMap, default: bool) -> bool {
    get_str(headers, "connection")
        .and_then(|h| {
            if h == "keep-alive" {
                Some(true)
            } else if h == "close" {
                Some(false)
            } else {
                None
            }
        })
        .unwrap_or(default)
}

fn get_str<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key).and_then(|v| v.to_str().ok())
}

fn get_as<T: FromStr>(headers: &HeaderMap, key: &str) -> Option<T> {
    get_str(headers, key).and_then(|v| v.parse().ok())
}
