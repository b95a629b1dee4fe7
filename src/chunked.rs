use crate::buf_reader::BufIo;
use crate::http11::read_line;
use crate::Error;
use std::io::{self, Read};

/// Decoder of chunked transfer encoding.
///
/// Keeps how far into the current chunk we are between reads, so an
/// inbound chunk larger than the caller's buffer is handed out across
/// successive reads and the surplus stays on the wire for the next one.
pub(crate) struct ChunkedDecoder {
    amount_left: usize,
    complete: bool,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        ChunkedDecoder {
            amount_left: 0,
            complete: false,
        }
    }

    pub fn is_end(&self) -> bool {
        self.complete
    }

    /// Read some decoded chunk data. Returns 0 once the zero-size chunk
    /// has terminated the body.
    pub fn read<R: Read>(&mut self, recv: &mut BufIo<R>, buf: &mut [u8]) -> Result<usize, Error> {
        if self.complete {
            return Ok(0);
        }

        if self.amount_left == 0 {
            let size = read_chunk_size(recv)?;

            if size == 0 {
                self.complete = true;
                read_trailers(recv)?;
                return Ok(0);
            }

            self.amount_left = size;
        }

        let max = buf.len().min(self.amount_left);
        let amount = recv.read(&mut buf[..max])?;

        if amount == 0 {
            // peer closed mid chunk.
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Partial body").into());
        }

        self.amount_left -= amount;

        if self.amount_left == 0 {
            // chunk data is followed by an empty line.
            let line = read_line_ctx(recv, "End of chunk newline")?;
            if !line.is_empty() {
                return Err(Error::Parser("End of chunk newline"));
            }
        }

        Ok(amount)
    }
}

fn read_chunk_size<R: Read>(recv: &mut BufIo<R>) -> Result<usize, Error> {
    let line = read_line_ctx(recv, "Chunk header")?;

    let hex_end = line
        .iter()
        .position(|b| !b.is_ascii_hexdigit())
        .unwrap_or(line.len());

    if hex_end == 0 {
        return Err(Error::Parser("Chunk header"));
    }

    // anything after the size must be a chunk extension. It is tolerated
    // and discarded, never surfaced to the consumer.
    if hex_end < line.len() && line[hex_end] != b';' {
        return Err(Error::Parser("Chunk header"));
    }

    let mut size: usize = 0;
    for &b in &line[..hex_end] {
        let v = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => unreachable!("checked hex digit"),
        };
        size = size
            .checked_mul(16)
            .and_then(|s| s.checked_add(v as usize))
            .ok_or(Error::Parser("Chunk header"))?;
    }

    trace!("Chunk size: {}", size);

    Ok(size)
}

/// Trailer lines after the terminating chunk are read and discarded up to
/// the empty line.
fn read_trailers<R: Read>(recv: &mut BufIo<R>) -> Result<(), Error> {
    loop {
        let line = read_line_ctx(recv, "End of chunk newline")?;
        if line.is_empty() {
            return Ok(());
        }
        trace!("Discarding trailer: {:?}", String::from_utf8_lossy(&line));
    }
}

fn read_line_ctx<R: Read>(recv: &mut BufIo<R>, context: &'static str) -> Result<Vec<u8>, Error> {
    read_line(recv).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Parser(context)
        } else {
            Error::Io(e)
        }
    })
}
