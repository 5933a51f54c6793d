//! Line-oriented connection transport.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};

/// One accepted client connection, read and written a line at a time.
///
/// This trait abstracts the byte-stream transport so sessions can run
/// against real sockets or an in-memory script in tests.
pub trait Connection {
    /// Blocks reading one line, returned without its terminator.
    /// `Ok(None)` means the peer closed the stream.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Writes one newline-terminated line and flushes it.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }
}

/// A TCP connection with buffered line reads.
#[derive(Debug)]
pub struct TcpConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    peer: SocketAddr,
}

impl TcpConnection {
    /// Wraps an accepted stream.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            peer,
        })
    }

    /// Returns the peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// An in-memory connection for tests: reads come from a fixed script,
/// writes are recorded.
///
/// When the script is drained, reads report EOF, or an injected error
/// if one was set.
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    incoming: VecDeque<String>,
    sent: Vec<String>,
    fail_when_drained: bool,
    fail_writes: bool,
}

impl ScriptedConnection {
    /// Creates a connection that will yield `lines` in order.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            incoming: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Makes reads fail with a broken pipe once the script is drained,
    /// instead of reporting EOF.
    pub fn fail_when_drained(mut self) -> Self {
        self.fail_when_drained = true;
        self
    }

    /// Makes every write fail with a broken pipe.
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Returns the lines written so far.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl Connection for ScriptedConnection {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.incoming.pop_front() {
            Some(line) => Ok(Some(line)),
            None if self.fail_when_drained => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"))
            }
            None => Ok(None),
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"));
        }
        self.sent.push(line.to_string());
        Ok(())
    }
}
