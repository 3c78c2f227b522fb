use std::io::{self, Read, Write};

use bytes::{buf::Reader, Buf, Bytes};

/// Which side of a `DuplexBuffer` is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been read or written yet.
    Fresh,
    /// Writes are accepted. Reads have not happened yet.
    Writing,
    /// Reads are accepted. Writes have not happened yet.
    Reading,
    /// The write side is frozen and the read side is in use.
    WriteFrozen,
    /// The read side is frozen and the write side is in use.
    ReadFrozen,
}

/// A one-shot duplex stream for driving a codec over a single HTTP exchange.
///
/// The write side appends to a growable buffer. The read side reads a fixed body.
/// Exactly one hand-off between the two is allowed: a client writes its request
/// and then reads the response, a server reads its request and then writes the
/// response. Touching a side after it has been handed off is an error.
#[derive(Debug)]
pub struct DuplexBuffer {
    phase: Phase,
    written: Vec<u8>,
    reader: Option<Reader<Bytes>>,
}

impl Default for DuplexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplexBuffer {
    /// A buffer with no read side. Use this for writing a request.
    pub fn new() -> Self {
        Self {
            phase: Phase::Fresh,
            written: Vec::new(),
            reader: None,
        }
    }

    /// A buffer reading `body`. Use this for serving a request.
    pub fn with_reader(body: Bytes) -> Self {
        Self {
            phase: Phase::Fresh,
            written: Vec::new(),
            reader: Some(body.reader()),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of bytes written so far.
    pub fn written_len(&self) -> usize {
        self.written.len()
    }

    /// End the write phase and take what was written.
    pub fn freeze_written(&mut self) -> Bytes {
        self.phase = match self.phase {
            Phase::Fresh | Phase::Writing | Phase::WriteFrozen => Phase::WriteFrozen,
            Phase::Reading | Phase::ReadFrozen => Phase::ReadFrozen,
        };
        Bytes::from(std::mem::take(&mut self.written))
    }

    /// Bind the read side. This can only happen once.
    pub fn attach_reader(&mut self, body: Bytes) -> io::Result<()> {
        if self.reader.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "duplex buffer already has a read side",
            ));
        }
        self.reader = Some(body.reader());
        Ok(())
    }

    /// Consume the buffer, yielding everything that was written.
    pub fn into_written(self) -> Bytes {
        Bytes::from(self.written)
    }

    fn enter_write(&mut self) -> io::Result<()> {
        self.phase = match self.phase {
            Phase::Fresh | Phase::Writing => Phase::Writing,
            Phase::Reading | Phase::ReadFrozen => Phase::ReadFrozen,
            Phase::WriteFrozen => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "write after the read phase began",
                ))
            }
        };
        Ok(())
    }

    fn enter_read(&mut self) -> io::Result<()> {
        self.phase = match self.phase {
            Phase::Fresh | Phase::Reading => Phase::Reading,
            Phase::Writing | Phase::WriteFrozen => Phase::WriteFrozen,
            Phase::ReadFrozen => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "read after the write phase began",
                ))
            }
        };
        Ok(())
    }
}

impl Write for DuplexBuffer {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.enter_write()?;
        self.written.extend_from_slice(buffer);
        Ok(buffer.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for DuplexBuffer {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if self.reader.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "duplex buffer has no read side",
            ));
        }
        self.enter_read()?;
        match self.reader.as_mut() {
            Some(reader) => reader.read(buffer),
            None => Ok(0),
        }
    }
}
