use std::io::{self, Read, Write};

/// Our own BufReader.
///
/// Line oriented reads (status line, headers, chunk sizes) fill the
/// internal buffer and consume from it. Body reads drain the buffer first
/// and then go directly to the underlying stream, capped by the caller's
/// buffer, so the framed end of a body is never overshot.
#[derive(Debug)]
pub(crate) struct BufIo<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
}

impl<R: Read> BufIo<R> {
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        BufIo {
            inner,
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    /// Unconsumed buffered bytes, reading more from the underlying stream
    /// when the buffer is drained. An empty return means EOF.
    pub fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos == self.buf.len() {
            self.pos = 0;
            self.buf.clear();

            let cap = self.buf.capacity().max(1);
            self.buf.resize(cap, 0);

            let amount = self.inner.read(&mut self.buf)?;
            self.buf.truncate(amount);
        }

        Ok(&self.buf[self.pos..])
    }

    pub fn consume(&mut self, amount: usize) {
        let new_pos = self.pos + amount;

        // can't consume more than we have.
        assert!(new_pos <= self.buf.len());

        if new_pos == self.buf.len() {
            // all was consumed, reset back to start.
            self.pos = 0;
            self.buf.clear();
        } else {
            self.pos = new_pos;
        }
    }

    /// Whether unconsumed bytes remain in the buffer. A socket with stray
    /// buffered bytes after the body end must not go back to the pool.
    pub fn has_buffered(&self) -> bool {
        self.pos < self.buf.len()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BufIo<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let has_amount = self.buf.len() - self.pos;

        if has_amount > 0 {
            let max = buf.len().min(has_amount);
            buf[..max].copy_from_slice(&self.buf[self.pos..self.pos + max]);
            self.consume(max);
            return Ok(max);
        }

        // once the inner buffer is used up, read directly from underlying.
        self.inner.read(buf)
    }
}

// * Boilerplate proxying below **********************************

impl<R: Write> Write for BufIo<R> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
