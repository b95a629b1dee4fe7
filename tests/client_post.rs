use hflow_h1::{parse_url, request, request_follow, Body, Error, Pool};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;

#[test]
fn url_encoded_post() -> Result<(), Error> {
    let addr = common::echo_server()?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/submit", addr))?
        .url_encoded_body(vec![("k", "v"), ("two words", "a+b")]);

    let res = request(&req, &pool)?;

    let echoed = String::from_utf8_lossy(&res.body).to_string();

    assert!(echoed.starts_with("POST /submit HTTP/1.1\r\n"));
    assert!(echoed.contains("Content-Length: 19\r\n"));
    assert!(echoed.contains("Content-Type: application/x-www-form-urlencoded\r\n"));
    assert!(echoed.ends_with("\r\n\r\nk=v&two+words=a%2Bb"));

    pool.close();

    Ok(())
}

#[test]
fn url_encoded_post_replaces_content_type() -> Result<(), Error> {
    let addr = common::echo_server()?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/submit", addr))?
        .header("Content-Type", "text/plain")
        .header("X-Keep", "yes")
        .url_encoded_body(vec![("a", "1")]);

    let res = request(&req, &pool)?;

    let echoed = String::from_utf8_lossy(&res.body).to_string();

    assert!(!echoed.contains("text/plain"));
    assert_eq!(echoed.matches("Content-Type:").count(), 1);
    assert!(echoed.contains("X-Keep: yes\r\n"));

    pool.close();

    Ok(())
}

#[test]
fn streamed_body() -> Result<(), Error> {
    let addr = common::echo_server()?;

    let pool = Pool::new();
    let mut req = parse_url(&format!("http://{}/upload", addr))?;
    req.method = "POST".to_string();
    req.body = Body::stream(5, || Box::new(&b"HELLO"[..]));

    let res = request(&req, &pool)?;

    let echoed = String::from_utf8_lossy(&res.body).to_string();

    assert!(echoed.contains("Content-Length: 5\r\n"));
    assert!(echoed.ends_with("\r\n\r\nHELLO"));

    pool.close();

    Ok(())
}

#[test]
fn streamed_body_longer_than_declared() -> Result<(), Error> {
    let addr = common::echo_server()?;

    let pool = Pool::new();
    let mut req = parse_url(&format!("http://{}/upload", addr))?;
    req.method = "POST".to_string();
    req.body = Body::stream(2, || Box::new(&b"HELLO"[..]));

    let err = request(&req, &pool).expect_err("body over declared length");

    assert_eq!(
        err.to_string(),
        "Body data longer than content-length header: 5 > 2"
    );

    pool.close();

    Ok(())
}

#[test]
fn streamed_body_shorter_than_declared() -> Result<(), Error> {
    let addr = common::echo_server()?;

    let pool = Pool::new();
    let mut req = parse_url(&format!("http://{}/upload", addr))?;
    req.method = "POST".to_string();
    req.body = Body::stream(10, || Box::new(&b"HELLO"[..]));

    let err = request(&req, &pool).expect_err("body under declared length");

    assert_eq!(
        err.to_string(),
        "Body data shorter than content-length header: 5 < 10"
    );

    pool.close();

    Ok(())
}

#[test]
fn streamed_body_replayed_across_redirect() -> Result<(), Error> {
    let addr = common::serve(|_, head, tcp| {
        let mut body = vec![0; common::head_content_length(&head)];
        tcp.read_exact(&mut body)?;
        assert_eq!(body, b"HELLO");

        if head.starts_with("POST /first ") {
            tcp.write_all(
                b"HTTP/1.1 307 Temporary Redirect\r\nLocation: /second\r\nContent-Length: 0\r\n\r\n",
            )?;
        } else {
            tcp.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")?;
        }
        Ok(true)
    })?;

    let produced = Arc::new(AtomicUsize::new(0));
    let produced_in_body = produced.clone();

    let pool = Pool::new();
    let mut req = parse_url(&format!("http://{}/first", addr))?;
    req.method = "POST".to_string();
    req.body = Body::stream(5, move || {
        produced_in_body.fetch_add(1, Ordering::SeqCst);
        Box::new(&b"HELLO"[..])
    });

    let res = request_follow(&req, &pool)?;

    assert_eq!(res.status, 200);

    // the producer ran once per transmission.
    assert_eq!(produced.load(Ordering::SeqCst), 2);

    pool.close();

    Ok(())
}
