#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Once};
use std::thread;

pub fn setup_logger() {
    static START: Once = Once::new();
    START.call_once(|| {
        let test_log = std::env::var("TEST_LOG")
            .map(|x| x != "0" && x.to_lowercase() != "false")
            .unwrap_or(false);
        let level = if test_log {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        };
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Warn)
            .filter_module("hflow_h1", level)
            .target(env_logger::Target::Stdout)
            .init();
    });
}

/// Spawn a test server on an ephemeral port and return its `host:port`.
///
/// `handler` is called once per request with the per-connection request
/// count, the request head (up to and including the blank line) and the
/// socket to write the response to (and read a request body from). It
/// returns whether to keep serving on the same connection.
pub fn serve<F>(handler: F) -> io::Result<String>
where
    F: Fn(usize, String, &mut TcpStream) -> io::Result<bool> + Send + Sync + 'static,
{
    setup_logger();

    let l = TcpListener::bind("127.0.0.1:0")?;
    let addr = l.local_addr()?;

    let handler = Arc::new(handler);

    thread::spawn(move || {
        for incoming in l.incoming() {
            let mut tcp = match incoming {
                Ok(v) => v,
                Err(_) => break,
            };

            let handler = handler.clone();

            thread::spawn(move || {
                let mut count = 0;
                loop {
                    let head = match read_head(&mut tcp) {
                        Ok(v) => v,
                        Err(_) => break,
                    };

                    // clean EOF between requests.
                    if head.is_empty() {
                        break;
                    }

                    match handler(count, head, &mut tcp) {
                        Ok(true) => count += 1,
                        _ => break,
                    }
                }
            });
        }
    });

    Ok(addr.to_string())
}

/// A server echoing each request (head + body) back as a 200 response
/// body, so tests can assert the exact serialised request client side.
pub fn echo_server() -> io::Result<String> {
    serve(|_, head, tcp| {
        let mut body = vec![0; head_content_length(&head)];
        tcp.read_exact(&mut body)?;

        let mut full = head.into_bytes();
        full.extend_from_slice(&body);

        let res = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", full.len());
        tcp.write_all(res.as_bytes())?;
        tcp.write_all(&full)?;

        Ok(true)
    })
}

/// Read one request head off the socket, up to and including \r\n\r\n.
/// Returns an empty string on clean EOF before the first byte.
pub fn read_head(tcp: &mut TcpStream) -> io::Result<String> {
    let mut buf = Vec::new();
    let mut one = [0_u8; 1];

    loop {
        let amount = tcp.read(&mut one)?;

        if amount == 0 {
            if buf.is_empty() {
                return Ok(String::new());
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "EOF in the middle of a request head",
            ));
        }

        buf.push(one[0]);

        if buf.ends_with(b"\r\n\r\n") {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buf).to_string())
}

/// The content-length a request head declares, 0 when absent.
pub fn head_content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let lower = line.to_ascii_lowercase();
            let value = lower.strip_prefix("content-length:")?;
            value.trim().parse().ok()
        })
        .unwrap_or(0)
}
