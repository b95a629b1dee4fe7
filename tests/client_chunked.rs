use hflow_h1::{parse_url, request, Error, Pool};
use std::io::Write;

mod common;

#[test]
fn chunked_two_chunks() -> Result<(), Error> {
    let addr = common::serve(|_, _, tcp| {
        tcp.write_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
        )?;
        Ok(true)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let res = request(&req, &pool)?;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"hello world");

    pool.close();

    Ok(())
}

#[test]
fn chunked_split_writes() -> Result<(), Error> {
    // the decoder must not depend on chunks arriving in single reads.
    let addr = common::serve(|_, _, tcp| {
        tcp.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")?;
        tcp.flush()?;
        tcp.write_all(b"b\r\nhel")?;
        tcp.flush()?;
        tcp.write_all(b"lo world\r\n")?;
        tcp.flush()?;
        tcp.write_all(b"0\r\n\r\n")?;
        Ok(true)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let res = request(&req, &pool)?;

    assert_eq!(res.body, b"hello world");

    pool.close();

    Ok(())
}

#[test]
fn chunked_hex_size_and_extension() -> Result<(), Error> {
    let addr = common::serve(|_, _, tcp| {
        // 0x10 bytes, chunk extension discarded.
        tcp.write_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              10;name=value\r\n0123456789abcdef\r\n0\r\n\r\n",
        )?;
        Ok(true)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let res = request(&req, &pool)?;

    assert_eq!(res.body, b"0123456789abcdef");

    pool.close();

    Ok(())
}

#[test]
fn chunked_trailers_ignored() -> Result<(), Error> {
    let addr = common::serve(|_, _, tcp| {
        tcp.write_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              2\r\nOK\r\n0\r\nX-Trailing: 1\r\n\r\n",
        )?;
        Ok(true)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let res = request(&req, &pool)?;

    assert_eq!(res.body, b"OK");

    pool.close();

    Ok(())
}

#[test]
fn broken_chunk_header() -> Result<(), Error> {
    let addr = common::serve(|_, _, tcp| {
        // not chunked framing at all.
        tcp.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nHELLO\r\n")?;
        Ok(false)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let err = request(&req, &pool).expect_err("broken chunked");

    assert_eq!(err.to_string(), "Failed parsing: Chunk header");

    pool.close();

    Ok(())
}

#[test]
fn missing_chunk_newline() -> Result<(), Error> {
    let addr = common::serve(|_, _, tcp| {
        // chunk data not followed by \r\n.
        tcp.write_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              5\r\nhelloXX\r\n",
        )?;
        Ok(false)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let err = request(&req, &pool).expect_err("missing newline");

    assert_eq!(err.to_string(), "Failed parsing: End of chunk newline");

    pool.close();

    Ok(())
}

#[test]
fn chunked_zero_length_body() -> Result<(), Error> {
    let addr = common::serve(|_, _, tcp| {
        tcp.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n")?;
        Ok(true)
    })?;

    let pool = Pool::new();
    let req = parse_url(&format!("http://{}/", addr))?;

    let res = request(&req, &pool)?;

    assert_eq!(res.body, b"");

    pool.close();

    Ok(())
}
