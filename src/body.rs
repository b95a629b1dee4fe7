use crate::buf_reader::BufIo;
use crate::limit::LimitRead;
use crate::transport::Transport;
use crate::Error;
use flate2::read::GzDecoder;
use std::io::{self, Read};

/// Receives a response body from the remote peer.
///
/// Handed to the consumer together with the [`ResponseHead`]. Chunks come
/// in order and never extend past the framed end of the body. The consumer
/// may stop reading early; the engine then closes the socket instead of
/// returning it to the pool.
///
/// [`ResponseHead`]: struct.ResponseHead.html
pub struct RecvBody<'a> {
    inner: Inner<'a>,
}

enum Inner<'a> {
    Plain(FramedRead<'a>),
    Gzip(GzDecoder<FramedRead<'a>>),
}

impl<'a> RecvBody<'a> {
    pub(crate) fn new(limit: LimitRead, gzip: bool, io: &'a mut BufIo<Transport>) -> Self {
        let framed = FramedRead { limit, io };

        // window-bits 31: the decoder takes gzip framing with the largest
        // window. Splicing happens here so the consumer only ever sees
        // decoded bytes.
        let inner = if gzip {
            Inner::Gzip(GzDecoder::new(framed))
        } else {
            Inner::Plain(framed)
        };

        RecvBody { inner }
    }

    /// Read some body data. Returns 0 at the end of the body.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        match &mut self.inner {
            Inner::Plain(v) => v.limit.read(&mut *v.io, buf),
            Inner::Gzip(v) => v.read(buf).map_err(|e| match Error::from_io(e) {
                Error::Io(io_err) if is_decode_err(&io_err) => Error::Parser("Gzip decode"),
                other => other,
            }),
        }
    }

    /// Read the rest of the body, appending to `out`. Returns the number
    /// of bytes read.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize, Error> {
        let mut buf = [0_u8; 8_192];
        let mut total = 0;

        loop {
            let amount = self.read(&mut buf)?;
            if amount == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&buf[..amount]);
            total += amount;
        }
    }

    pub(crate) fn is_reusable(&self) -> bool {
        self.limit().is_reusable()
    }

    fn limit(&self) -> &LimitRead {
        match &self.inner {
            Inner::Plain(v) => &v.limit,
            Inner::Gzip(v) => &v.get_ref().limit,
        }
    }
}

impl io::Read for RecvBody<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        RecvBody::read(self, buf).map_err(Error::into_io)
    }
}

/// Flate2's errors for a broken stream, as opposed to a failing underlying
/// transport read.
fn is_decode_err(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData
    )
}

/// Reader applying the framing limit. `io::Read` exists for the gzip
/// decoder to layer on top; crate errors tunnel through `io::Error` and
/// are restored in `RecvBody::read`.
struct FramedRead<'a> {
    limit: LimitRead,
    io: &'a mut BufIo<Transport>,
}

impl io::Read for FramedRead<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.limit.read(&mut *self.io, buf).map_err(Error::into_io)
    }
}
