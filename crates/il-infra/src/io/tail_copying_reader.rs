use std::io::{self, Read, Write};

const TAIL_CHUNK: usize = 8 * 1024;

/// Reader that tees everything it reads into a sink.
///
/// Used while downloading: the caller reads a bounded prefix to sniff the
/// image header, then calls [`copy_tail`](Self::copy_tail) so the sink ends
/// up with the complete body. After every read that yielded bytes the
/// callback receives the running total; an error returned from the callback
/// aborts the read.
///
/// 边读边写：读取到的字节同时写入 sink，并在每次读取后回调累计字节数。
pub struct TailCopyingReader<R, W, F>
where
    R: Read,
    W: Write,
    F: FnMut(u64) -> io::Result<()>,
{
    source: Option<R>,
    sink: Option<W>,
    on_progress: F,
    copied: u64,
}

impl<R, W, F> TailCopyingReader<R, W, F>
where
    R: Read,
    W: Write,
    F: FnMut(u64) -> io::Result<()>,
{
    pub fn new(source: R, sink: W, on_progress: F) -> Self {
        Self {
            source: Some(source),
            sink: Some(sink),
            on_progress,
            copied: 0,
        }
    }

    /// Bytes read (and written) so far.
    pub fn bytes_copied(&self) -> u64 {
        self.copied
    }

    /// Drain the rest of the source into the sink. Returns the number of
    /// bytes copied by this call.
    pub fn copy_tail(&mut self) -> io::Result<u64> {
        let mut buf = vec![0u8; TAIL_CHUNK];
        let mut total = 0u64;
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Ok(total),
                Ok(n) => total += n as u64,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Flush and close the sink, then close the source. Both are dropped
    /// even when the flush fails.
    pub fn finish(mut self) -> io::Result<u64> {
        let flushed = match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        };
        self.sink.take();
        self.source.take();
        flushed.map(|()| self.copied)
    }
}

impl<R, W, F> Read for TailCopyingReader<R, W, F>
where
    R: Read,
    W: Write,
    F: FnMut(u64) -> io::Result<()>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (Some(source), Some(sink)) = (self.source.as_mut(), self.sink.as_mut()) else {
            return Ok(0);
        };

        let n = source.read(buf)?;
        if n > 0 {
            sink.write_all(&buf[..n])?;
            self.copied += n as u64;
            (self.on_progress)(self.copied)?;
        }
        Ok(n)
    }
}
