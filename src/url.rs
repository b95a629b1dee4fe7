use crate::encoding::{encode_path, parse_query};
use crate::request::{default_port, Body, Request};
use crate::Error;

/// Parse a URL into a [`Request`] with method `GET`, no headers and no body.
///
/// Only `http://` and `https://` are accepted (exact lowercase). The
/// authority is everything up to the first `/`, split on the first `:` into
/// host and decimal port; a missing port defaults to 80 or 443. The path is
/// re-encoded byte by byte (`/` preserved, non-unreserved bytes become
/// uppercase `%HH`), which keeps non-ASCII paths usable. The query is split
/// on `&`/`=` and decoded with the form rules; a `#` fragment in the query
/// is discarded together with everything after it.
pub fn parse_url(url: &str) -> Result<Request, Error> {
    let (secure, rest) = if let Some(rest) = url.strip_prefix("http://") {
        (false, rest)
    } else if let Some(rest) = url.strip_prefix("https://") {
        (true, rest)
    } else {
        return Err(Error::InvalidUrl {
            url: url.to_string(),
            reason: "Invalid scheme",
        });
    };

    let rest = rest.as_bytes();

    let slash = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
    let (authority, after) = rest.split_at(slash);

    let (host, port) = match authority.iter().position(|&b| b == b':') {
        None => (authority, default_port(secure)),
        Some(i) => {
            let port = std::str::from_utf8(&authority[i + 1..])
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .ok_or_else(|| Error::InvalidUrl {
                    url: url.to_string(),
                    reason: "Invalid port",
                })?;
            (&authority[..i], port)
        }
    };

    let (path, raw_query) = match after.iter().position(|&b| b == b'?') {
        None => (after, &[][..]),
        Some(i) => (&after[..i], &after[i + 1..]),
    };

    // a fragment is not sent on the wire.
    let raw_query = match raw_query.iter().position(|&b| b == b'#') {
        None => raw_query,
        Some(i) => &raw_query[..i],
    };

    let path = if path.is_empty() {
        "/".to_string()
    } else {
        encode_path(path)
    };

    Ok(Request {
        method: "GET".to_string(),
        secure,
        host: String::from_utf8_lossy(host).into_owned(),
        port,
        path,
        query: parse_query(raw_query),
        headers: Vec::new(),
        body: Body::empty(),
    })
}
