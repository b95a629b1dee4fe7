use crate::encoding::form_encode;
use crate::Error;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// Header names the engine injects itself. Caller values for these are
/// dropped, matched case-insensitively.
const RESERVED_HEADERS: &[&str] = &["host", "content-length", "accept-encoding"];

/// Size of buffer copying a streamed request body to the transport.
const SEND_BUF_SIZE: usize = 8_192;

pub(crate) fn default_port(secure: bool) -> u16 {
    if secure {
        443
    } else {
        80
    }
}

/// Everything needed to issue one request.
///
/// Usually obtained from [`parse_url`] and adjusted through the public
/// fields or the builder-style helpers. Cloning is cheap enough to do per
/// redirect hop; a streamed body clones as a shared replayable producer.
///
/// [`parse_url`]: fn.parse_url.html
#[derive(Clone, Debug)]
pub struct Request {
    /// Request method. Defaults to `GET`.
    pub method: String,
    /// Whether to use TLS.
    pub secure: bool,
    /// Host to connect to, verbatim from the URL.
    pub host: String,
    /// Port to connect to.
    pub port: u16,
    /// URL-encoded path. A missing leading `/` is added on the wire.
    pub path: String,
    /// Decoded query parameters, in order, duplicates preserved.
    pub query: Vec<(Vec<u8>, Vec<u8>)>,
    /// Additional request headers, sent verbatim and in order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Body,
}

impl Request {
    /// Append a request header.
    pub fn header<K, V>(mut self, name: K, value: V) -> Request
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Turn this into a form POST: the body becomes the url-encoded pairs,
    /// the method `POST`, and any `Content-Type` header is replaced with
    /// `application/x-www-form-urlencoded`.
    pub fn url_encoded_body<I, K, V>(mut self, pairs: I) -> Request
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.body = Body::Bytes(form_encode(pairs).into_bytes());
        self.method = "POST".to_string();
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        self.headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        self
    }
}

/// Factory for the readers of a streamed request body.
pub type BodyProducer = Arc<dyn Fn() -> Box<dyn Read + Send> + Send + Sync>;

/// A request body.
#[derive(Clone)]
pub enum Body {
    /// Complete body held in memory.
    Bytes(Vec<u8>),
    /// Body streamed from a producer, with a declared length. The producer
    /// is invoked once per transmission; following a redirect invokes it
    /// again, so it must be replayable.
    Stream {
        /// Declared byte length, sent as `Content-Length`.
        len: u64,
        /// Reader factory.
        producer: BodyProducer,
    },
}

impl Body {
    /// The empty body.
    pub fn empty() -> Body {
        Body::Bytes(Vec::new())
    }

    /// An in-memory body.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Body {
        Body::Bytes(bytes.into())
    }

    /// A streamed body of `len` bytes read from `producer()`.
    pub fn stream<F>(len: u64, producer: F) -> Body
    where
        F: Fn() -> Box<dyn Read + Send> + Send + Sync + 'static,
    {
        Body::Stream {
            len,
            producer: Arc::new(producer),
        }
    }

    /// Declared byte length of the body.
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(b) => b.len() as u64,
            Body::Stream { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Body::Bytes(b) => write!(f, "Bytes({})", b.len()),
            Body::Stream { len, .. } => write!(f, "Stream({})", len),
        }
    }
}

/// Write an http/1.1 request to the transport: request line, injected
/// headers, caller headers in order, blank line, body bytes.
#[allow(clippy::write_with_newline)]
pub(crate) fn write_request<W: Write>(req: &Request, w: &mut W) -> Result<(), Error> {
    let mut head = Vec::with_capacity(256);

    write!(head, "{} {} HTTP/1.1\r\n", req.method, wire_path(req))?;
    write!(head, "Host: {}\r\n", host_header(req))?;
    write!(head, "Content-Length: {}\r\n", req.body.len())?;
    write!(head, "Accept-Encoding: gzip\r\n")?;

    for (name, value) in &req.headers {
        if is_reserved(name) {
            continue;
        }
        write!(head, "{}: {}\r\n", name, value)?;
    }
    write!(head, "\r\n")?;

    debug!("write_request: {:?}", String::from_utf8_lossy(&head));

    w.write_all(&head)?;

    match &req.body {
        Body::Bytes(b) => w.write_all(b)?,
        Body::Stream { len, producer } => write_stream_body(*len, producer, w)?,
    }

    w.flush()?;

    Ok(())
}

/// The path as sent on the wire: leading `/` guaranteed, rendered query
/// appended after `?` when non-empty.
fn wire_path(req: &Request) -> String {
    let mut path = String::new();
    if !req.path.starts_with('/') {
        path.push('/');
    }
    path.push_str(&req.path);
    if !req.query.is_empty() {
        path.push('?');
        path.push_str(&form_encode(req.query.iter().map(|(k, v)| (k, v))));
    }
    path
}

/// `host` when the port is the scheme default, `host:port` otherwise.
fn host_header(req: &Request) -> String {
    if req.port == default_port(req.secure) {
        req.host.clone()
    } else {
        format!("{}:{}", req.host, req.port)
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS.iter().any(|r| name.eq_ignore_ascii_case(r))
}

fn write_stream_body<W: Write>(len: u64, producer: &BodyProducer, w: &mut W) -> Result<(), Error> {
    let mut reader = producer();
    let mut buf = [0_u8; SEND_BUF_SIZE];
    let mut total: u64 = 0;

    loop {
        let amount = reader.read(&mut buf)?;
        if amount == 0 {
            break;
        }
        total += amount as u64;
        if total > len {
            let m = format!(
                "Body data longer than content-length header: {} > {}",
                total, len
            );
            return Err(Error::User(m));
        }
        w.write_all(&buf[..amount])?;
    }

    if total < len {
        let m = format!(
            "Body data shorter than content-length header: {} < {}",
            total, len
        );
        return Err(Error::User(m));
    }

    Ok(())
}
