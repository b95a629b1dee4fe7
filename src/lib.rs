//! Streaming HTTP/1.1 client.
//!
//! Performs HTTP and HTTPS requests while exposing the response body as a
//! stream read incrementally by the caller, so responses of unbounded size
//! are processed in bounded memory. Plaintext connections are pooled per
//! origin and reused across requests; redirects are followed on request.
//!
//! The simplest entry point buffers everything:
//!
//! ```no_run
//! let body = hflow_h1::simple_http("http://example.com/")?;
//! # Ok::<(), hflow_h1::Error>(())
//! ```
//!
//! The streaming surface hands the parsed status and headers to a consumer
//! which then reads the body at its own pace:
//!
//! ```no_run
//! use hflow_h1::{http, parse_url, Pool};
//!
//! let req = parse_url("http://example.com/big.bin")?;
//! let pool = Pool::new();
//!
//! let total = http(&req, &pool, |head, body| {
//!     assert_eq!(head.status, 200);
//!     let mut buf = [0_u8; 8192];
//!     let mut total = 0;
//!     loop {
//!         let amount = body.read(&mut buf)?;
//!         if amount == 0 {
//!             break;
//!         }
//!         total += amount;
//!     }
//!     Ok(total)
//! })?;
//!
//! pool.close();
//! # Ok::<(), hflow_h1::Error>(())
//! ```

#[macro_use]
extern crate log;

mod body;
mod buf_reader;
mod chunked;
mod client;
mod encoding;
mod error;
mod http11;
mod limit;
mod pool;
mod request;
mod transport;
mod url;

pub use body::RecvBody;
pub use client::{buffered, http, http_follow, request, request_follow, simple_http, Response};
pub use encoding::{form_encode, parse_query, url_decode, url_encode};
pub use error::Error;
pub use http11::ResponseHead;
pub use pool::{with_pool, Pool};
pub use request::{Body, BodyProducer, Request};
pub use url::parse_url;
