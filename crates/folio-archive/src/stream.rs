//! Seekable byte source used to open documents from files or memory.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Origin for [`ByteStream::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Whence {
    Start,
    Current,
    End,
}

trait Source: Read + Seek + Send {}
impl<T: Read + Seek + Send> Source for T {}

/// Readable, seekable stream over a file, an in-memory buffer, or any
/// `Read + Seek` source.
pub struct ByteStream {
    inner: Box<dyn Source>,
    len: u64,
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream").field("len", &self.len).finish()
    }
}

impl ByteStream {
    /// Wrap any seekable reader. The total length is measured once.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the source cannot seek.
    pub fn from_reader<R: Read + Seek + Send + 'static>(mut reader: R) -> io::Result<Self> {
        let pos = reader.stream_position()?;
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            inner: Box::new(reader),
            len,
        })
    }

    /// Stream over an owned buffer.
    #[must_use = "creates a new ByteStream"]
    pub fn from_memory(bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u64;
        Self {
            inner: Box::new(Cursor::new(bytes)),
            len,
        }
    }

    /// Open a file for reading.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening or measuring the file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            inner: Box::new(BufReader::new(file)),
            len,
        })
    }

    /// Total length in bytes.
    #[inline]
    #[must_use = "returns the stream length"]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    #[must_use = "returns whether the stream is empty"]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read up to `buf.len()` bytes, returning how many were read (0 at EOF).
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    /// Next byte, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut b = [0u8; 1];
        loop {
            match self.inner.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(b[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Whether the read position is at or past the end.
    ///
    /// # Errors
    ///
    /// Returns the underlying seek error.
    pub fn is_eof(&mut self) -> io::Result<bool> {
        Ok(self.tell()? >= self.len)
    }

    /// Move the read position, returning the new absolute offset.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] for a negative absolute offset,
    /// otherwise the underlying seek error.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> io::Result<u64> {
        let from = match whence {
            Whence::Start => SeekFrom::Start(u64::try_from(offset).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "negative seek from start")
            })?),
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        self.inner.seek(from)
    }

    /// Current read position.
    ///
    /// # Errors
    ///
    /// Returns the underlying seek error.
    pub fn tell(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    /// Read everything from the current position to the end.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let remaining = self.len.saturating_sub(self.tell()?);
        let mut out = Vec::with_capacity(usize::try_from(remaining).unwrap_or(0));
        self.inner.read_to_end(&mut out)?;
        Ok(out)
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for ByteStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
