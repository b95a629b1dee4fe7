use std::fmt;
use std::io;

/// Possible errors from this crate.
#[derive(Debug)]
pub enum Error {
    /// The URL handed to [`parse_url`] could not be understood. Carries the
    /// original input and a static reason such as `"Invalid scheme"`.
    ///
    /// [`parse_url`]: fn.parse_url.html
    InvalidUrl {
        /// The URL as given by the caller.
        url: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// Malformed response framing. Carries a context naming the parsing
    /// stage, such as `"Chunk header"` or `"Gzip decode"`.
    Parser(&'static str),
    /// Final status outside [200, 300). Only produced by [`simple_http`],
    /// with the buffered response body.
    ///
    /// [`simple_http`]: fn.simple_http.html
    Status(u16, Vec<u8>),
    /// The redirect chain exceeded the cap of 10 hops.
    TooManyRedirects,
    /// A user/usage problem such as a streamed request body yielding more
    /// bytes than its declared length.
    User(String),
    /// A wrapped std::io::Error from the underlying transport (socket).
    Io(io::Error),
    /// HTTP/1.1 parse errors from the `httparse` crate.
    Http11Parser(httparse::Error),
    /// TLS errors from the `rustls` crate.
    Tls(rustls::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidUrl { url, reason } => write!(f, "{}: {}", reason, url),
            Error::Parser(context) => write!(f, "Failed parsing: {}", context),
            Error::Status(code, _) => write!(f, "Non-success status: {}", code),
            Error::TooManyRedirects => write!(f, "Too many redirects"),
            Error::User(v) => write!(f, "{}", v),
            Error::Io(v) => fmt::Display::fmt(v, f),
            Error::Http11Parser(v) => write!(f, "http11 parser: {}", v),
            Error::Tls(v) => write!(f, "tls: {}", v),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<httparse::Error> for Error {
    fn from(e: httparse::Error) -> Self {
        Error::Http11Parser(e)
    }
}

impl From<rustls::Error> for Error {
    fn from(e: rustls::Error) -> Self {
        Error::Tls(e)
    }
}

impl Error {
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Error::Io(i) => i,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }

    /// Recover a crate error that round-tripped through `io::Error`, which
    /// happens when the gzip decoder reads from the framed stream.
    pub(crate) fn from_io(e: io::Error) -> Error {
        if e.get_ref().map(|inner| inner.is::<Error>()).unwrap_or(false) {
            let inner = e.into_inner().expect("checked inner error");
            return *inner.downcast::<Error>().expect("checked error type");
        }
        Error::Io(e)
    }
}
