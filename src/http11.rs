use crate::buf_reader::BufIo;
use crate::Error;
use http::header::{HeaderName, HeaderValue};
use std::io::{self, Read};

// Response headers today vary in size from ~200 bytes to over 2KB.
// As applications use more cookies and user agents expand features,
// typical header sizes of 700-800 bytes is common.
// http://dev.chromium.org/spdy/spdy-whitepaper

/// Parsed response status line and headers.
#[derive(Debug)]
pub struct ResponseHead {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase, verbatim from the wire.
    pub reason: String,
    /// Protocol version of the response.
    pub version: http::Version,
    /// Response headers. Names compare case-insensitively, duplicates are
    /// preserved as multiple values.
    pub headers: http::HeaderMap,
}

/// Read and parse an http/1.1 response head off the transport.
pub(crate) fn read_response_head<R: Read>(io: &mut BufIo<R>) -> Result<ResponseHead, Error> {
    let mut buf = Vec::with_capacity(512);
    read_until_crlfcrlf(io, &mut buf)?;
    try_parse_head(&buf)
}

/// Parse a complete (CRLF CRLF terminated) response head.
pub(crate) fn try_parse_head(buf: &[u8]) -> Result<ResponseHead, Error> {
    trace!("try_parse_head: {:?}", String::from_utf8_lossy(buf));

    let mut headers = [httparse::EMPTY_HEADER; 128];
    let mut parser = httparse::Response::new(&mut headers);

    let status = parser.parse(buf)?;

    if status.is_partial() {
        // invariant: the caller hands us a full head ending in \r\n\r\n,
        // partial here means the status line itself didn't parse out.
        return Err(Error::Parser("Status line"));
    }

    let code = parser.code.ok_or(Error::Parser("Status line"))?;
    let reason = parser.reason.unwrap_or("").to_string();

    let version = match parser.version {
        Some(0) => http::Version::HTTP_10,
        _ => http::Version::HTTP_11,
    };

    let mut map = http::HeaderMap::new();
    for head in parser.headers.iter() {
        let name = HeaderName::from_bytes(head.name.as_bytes());
        let value = HeaderValue::from_bytes(head.value);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            (Err(e), _) => {
                debug!("Dropping bad header name: {}", e);
            }
            (Ok(name), Err(e)) => {
                debug!("Dropping bad header value ({}): {}", name, e);
            }
        }
    }

    debug!("try_parse_head success: {} {}", code, reason);

    Ok(ResponseHead {
        status: code,
        reason,
        version,
        headers: map,
    })
}

const END_OF_HEADER: &[u8] = &[b'\r', b'\n', b'\r', b'\n'];

/// Read from the transport into `buf` until \r\n\r\n, which indicates the
/// end of the headers and body begins.
pub(crate) fn read_until_crlfcrlf<R: Read>(
    io: &mut BufIo<R>,
    buf: &mut Vec<u8>,
) -> io::Result<()> {
    let mut end_index = 0;

    loop {
        let chunk = io.fill_buf()?;
        if chunk.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "EOF before complete http11 header",
            ));
        }

        let b = chunk[0];
        io.consume(1);
        buf.push(b);

        if b == END_OF_HEADER[end_index] {
            end_index += 1;
        } else if b == b'\r' {
            end_index = 1;
        } else {
            end_index = 0;
        }

        if end_index == END_OF_HEADER.len() {
            // we found the end of header sequence
            return Ok(());
        }
    }
}

/// Read a single CRLF (or bare LF) terminated line, without the line ending.
pub(crate) fn read_line<R: Read>(io: &mut BufIo<R>) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();

    loop {
        let chunk = io.fill_buf()?;
        if chunk.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "EOF in the middle of a line",
            ));
        }

        match chunk.iter().position(|&b| b == b'\n') {
            Some(i) => {
                line.extend_from_slice(&chunk[..i]);
                io.consume(i + 1);
                break;
            }
            None => {
                let amount = chunk.len();
                line.extend_from_slice(chunk);
                io.consume(amount);
            }
        }
    }

    if line.last() == Some(&b'\r') {
        line.pop();
    }

    Ok(line)
}
