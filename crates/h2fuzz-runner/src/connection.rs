//! Byte transports the drivers write fuzzed data to.
//!
//! A transport assumes the connection is gone after any I/O error; the
//! drivers decide whether to reconnect.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

/// Default maximum number of bytes read per receive call.
pub const DEFAULT_RECEIVE_LENGTH: usize = 1024;

/// How long a receive waits for the peer before returning nothing.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection capability set used by the drivers.
pub trait Transport {
    /// Open a fresh connection, dropping any previous one.
    fn connect(&mut self) -> io::Result<()>;

    /// Write all of `data`, connecting first if needed.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read at most `max_len` bytes. An empty result means the peer sent
    /// nothing in time or closed the connection.
    fn receive(&mut self, max_len: usize) -> io::Result<Bytes>;

    /// Drop the connection.
    fn close(&mut self);

    fn is_connected(&self) -> bool;
}

/// Plain TCP client.
#[derive(Debug)]
pub struct Client {
    address:      Option<String>,
    read_timeout: Option<Duration>,
    stream:       Option<TcpStream>,
}

impl Client {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address:      Some(address.into()),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            stream:       None,
        }
    }

    /// Wrap an accepted connection, keeping its socket options. It cannot
    /// reconnect once closed.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            address:      None,
            read_timeout: stream.read_timeout().ok().flatten(),
            stream:       Some(stream),
        }
    }

    /// `None` blocks until the peer sends something.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        if self.stream.is_none() {
            self.connect()?;
        }
        self.stream.as_mut().ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

impl Transport for Client {
    fn connect(&mut self) -> io::Result<()> {
        self.stream = None;
        let Some(address) = &self.address else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "accepted connection cannot reconnect",
            ));
        };
        debug!("connect to {address}");
        let stream = TcpStream::connect(address.as_str())?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let result = self.stream().and_then(|stream| stream.write_all(data));
        if let Err(err) = &result {
            debug!("could not send data: {err}");
            self.stream = None;
        }
        result
    }

    fn receive(&mut self, max_len: usize) -> io::Result<Bytes> {
        let mut buffer = vec![0u8; max_len];
        let result = self.stream().and_then(|stream| stream.read(&mut buffer));
        match result {
            Ok(0) => {
                debug!("peer closed the connection");
                self.stream = None;
                Ok(Bytes::new())
            },
            Ok(n) => {
                buffer.truncate(n);
                Ok(Bytes::from(buffer))
            },
            Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(Bytes::new())
            },
            Err(err) => {
                debug!("could not receive data: {err}");
                self.stream = None;
                Err(err)
            },
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Retries connect and send before giving up.
///
/// Every failed connect is followed by `delay`; a failed send reconnects
/// and writes the same bytes again. The attempt budget is shared by both.
#[derive(Debug)]
pub struct StubbornClient<T = Client> {
    inner:        T,
    max_attempts: u32,
    delay:        Duration,
}

impl<T: Transport> StubbornClient<T> {
    pub fn new(inner: T, max_attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn gave_up(&self, last: Option<io::Error>) -> io::Error {
        let detail = last.map(|err| format!(": {err}")).unwrap_or_default();
        io::Error::other(format!(
            "could not reach the peer after {} attempts{detail}",
            self.max_attempts
        ))
    }
}

impl<T: Transport> Transport for StubbornClient<T> {
    fn connect(&mut self) -> io::Result<()> {
        let mut last = None;
        for attempt in 1..=self.max_attempts {
            debug!("connect, attempt #{attempt}");
            match self.inner.connect() {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!("could not connect: {err}");
                    last = Some(err);
                    if attempt < self.max_attempts {
                        std::thread::sleep(self.delay);
                    }
                },
            }
        }
        Err(self.gave_up(last))
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let mut last = None;
        for attempt in 1..=self.max_attempts {
            if !self.inner.is_connected() {
                debug!("connect, attempt #{attempt}");
                if let Err(err) = self.inner.connect() {
                    debug!("could not connect: {err}");
                    last = Some(err);
                    if attempt < self.max_attempts {
                        std::thread::sleep(self.delay);
                    }
                    continue;
                }
            }
            match self.inner.send(data) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!("could not send data: {err}");
                    last = Some(err);
                },
            }
        }
        Err(self.gave_up(last))
    }

    fn receive(&mut self, max_len: usize) -> io::Result<Bytes> {
        self.inner.receive(max_len)
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}
