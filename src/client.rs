use crate::body::RecvBody;
use crate::buf_reader::BufIo;
use crate::http11::{read_response_head, ResponseHead};
use crate::limit::{allow_reuse, is_gzip, LimitRead};
use crate::pool::{with_pool, Pool};
use crate::request::{write_request, Body, Request};
use crate::transport::Transport;
use crate::url::parse_url;
use crate::Error;

/// Size of buffer reading response body into.
const READ_BUF_INIT_SIZE: usize = 16_384;

/// Redirect hops allowed before `Error::TooManyRedirects`.
const MAX_REDIRECTS: usize = 10;

/// Perform one request and hand the streamed response to `consumer`.
///
/// Plaintext connections come from the pool when an idle socket exists for
/// the origin, otherwise a new one is dialled. The request is written in
/// full before the response is read. The consumer receives the parsed
/// status/headers and a [`RecvBody`] to read the (gzip-decoded if the
/// response says so) body from; whatever it returns is returned here.
///
/// After the consumer is done, a plaintext socket whose body was consumed
/// to the framed end goes back to the pool. Early stops, read-to-end
/// framing, `connection: close` and every error path close the socket
/// instead.
///
/// [`RecvBody`]: struct.RecvBody.html
pub fn http<T, F>(req: &Request, pool: &Pool, consumer: F) -> Result<T, Error>
where
    F: FnOnce(&ResponseHead, &mut RecvBody<'_>) -> Result<T, Error>,
{
    let transport = if req.secure {
        Transport::dial(true, &req.host, req.port)?
    } else {
        match pool.acquire(&req.host, req.port) {
            Some(tcp) => Transport::from_tcp(tcp),
            None => Transport::dial(false, &req.host, req.port)?,
        }
    };

    let mut io = BufIo::with_capacity(READ_BUF_INIT_SIZE, transport);

    // the request goes out in full before we read the response. No pipelining.
    write_request(req, &mut io)?;

    let head = read_response_head(&mut io)?;

    let limit = LimitRead::from_headers(&head.headers, req.method == "HEAD");
    let gzip = is_gzip(&head.headers);

    let mut body = RecvBody::new(limit, gzip, &mut io);

    let ret = consumer(&head, &mut body)?;

    let reusable = body.is_reusable();
    drop(body);

    if reusable && !io.has_buffered() && allow_reuse(&head.headers, head.version) {
        if let Some(tcp) = io.into_inner().into_tcp() {
            pool.release(&req.host, req.port, tcp);
        }
    }
    // otherwise dropping `io` closes the socket.

    Ok(ret)
}

/// Like [`http`], but following up to 10 redirects.
///
/// A response with status in [300, 400) and a `location` header is not
/// handed to the consumer; instead the request is rewritten against the
/// location and reissued. Everything else reaches the consumer unchanged,
/// which is why it may be invoked on a 3xx that lacks a `location`.
///
/// [`http`]: fn.http.html
pub fn http_follow<T, F>(req: &Request, pool: &Pool, mut consumer: F) -> Result<T, Error>
where
    F: FnMut(&ResponseHead, &mut RecvBody<'_>) -> Result<T, Error>,
{
    follow(req.clone(), pool, MAX_REDIRECTS, &mut consumer)
}

enum Hop<T> {
    Done(T),
    Redirect(Request),
}

fn follow<T, F>(req: Request, pool: &Pool, redirects_left: usize, consumer: &mut F) -> Result<T, Error>
where
    F: FnMut(&ResponseHead, &mut RecvBody<'_>) -> Result<T, Error>,
{
    // reborrow for the closure so the recursion below can use it again.
    let inner = &mut *consumer;

    let hop = http(&req, pool, |head, body| {
        if (300..400).contains(&head.status) {
            if let Some(location) = head.headers.get("location") {
                let target = redirect_target(&req, location.as_bytes())?;

                if redirects_left == 0 {
                    return Err(Error::TooManyRedirects);
                }

                return Ok(Hop::Redirect(next_request(&req, head.status, target)));
            }
        }

        inner(head, body).map(Hop::Done)
    })?;

    match hop {
        Hop::Done(v) => Ok(v),
        Hop::Redirect(next) => {
            debug!(
                "Redirect {} -> {}:{}{}",
                req.host, next.host, next.port, next.path
            );
            follow(next, pool, redirects_left - 1, consumer)
        }
    }
}

/// Parse a `location` header value into a request. A relative location
/// (leading `/`) resolves against the current request's origin.
fn redirect_target(req: &Request, location: &[u8]) -> Result<Request, Error> {
    let location = String::from_utf8_lossy(location);

    if location.starts_with('/') {
        let scheme = if req.secure { "https" } else { "http" };
        parse_url(&format!(
            "{}://{}:{}{}",
            scheme, req.host, req.port, location
        ))
    } else {
        parse_url(&location)
    }
}

/// The next request of a redirect chain: the original request with
/// host/port/secure/path/query replaced from the target. A 303 forces the
/// method to `GET` and drops the body; other statuses carry the body and
/// take the target's method, which the URL parser defaults to `GET` as
/// well.
fn next_request(req: &Request, status: u16, target: Request) -> Request {
    let mut next = req.clone();
    next.secure = target.secure;
    next.host = target.host;
    next.port = target.port;
    next.path = target.path;
    next.query = target.query;

    if status == 303 {
        next.method = "GET".to_string();
        next.body = Body::empty();
    } else {
        next.method = target.method;
    }

    next
}

/// Response as collected by the buffered consumer.
#[derive(Debug)]
pub struct Response {
    /// Numeric status code.
    pub status: u16,
    /// Response headers.
    pub headers: http::HeaderMap,
    /// The complete body.
    pub body: Vec<u8>,
}

/// Consumer that drains the body into memory, yielding a [`Response`].
///
/// [`Response`]: struct.Response.html
pub fn buffered(head: &ResponseHead, body: &mut RecvBody<'_>) -> Result<Response, Error> {
    let mut out = Vec::new();
    body.read_to_end(&mut out)?;

    Ok(Response {
        status: head.status,
        headers: head.headers.clone(),
        body: out,
    })
}

/// One buffered request, no redirects.
pub fn request(req: &Request, pool: &Pool) -> Result<Response, Error> {
    http(req, pool, buffered)
}

/// One buffered request, following up to 10 redirects.
pub fn request_follow(req: &Request, pool: &Pool) -> Result<Response, Error> {
    http_follow(req, pool, buffered)
}

/// Download a URL, following redirects, within a pool scoped to this one
/// call. Returns the body when the final status is in [200, 300) and
/// `Error::Status` with the status code and buffered body otherwise.
pub fn simple_http(url: &str) -> Result<Vec<u8>, Error> {
    let req = parse_url(url)?;

    with_pool(|pool| {
        let res = request_follow(&req, pool)?;

        if (200..300).contains(&res.status) {
            Ok(res.body)
        } else {
            Err(Error::Status(res.status, res.body))
        }
    })
}
