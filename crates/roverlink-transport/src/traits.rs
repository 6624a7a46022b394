use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// A connected byte link to the controller. Implements Read + Write.
///
/// Reads that time out surface as `ErrorKind::TimedOut` or `ErrorKind::WouldBlock`
/// depending on the link kind; a read of zero bytes always means the link closed.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    Serial(crate::serial::SerialStream),
    Tcp(std::net::TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Serial(stream) => stream.read(buf),
            LinkStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Serial(stream) => stream.write(buf),
            LinkStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(stream) => stream.flush(),
            LinkStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl LinkStream {
    pub(crate) fn from_serial(stream: crate::serial::SerialStream) -> Self {
        Self {
            inner: LinkStreamInner::Serial(stream),
        }
    }

    pub(crate) fn from_tcp(stream: std::net::TcpStream) -> Self {
        Self {
            inner: LinkStreamInner::Tcp(stream),
        }
    }

    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Clone the handle so reads and writes can be driven from separate owners.
    ///
    /// Both handles refer to the same open link.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            LinkStreamInner::Serial(stream) => LinkStreamInner::Serial(stream.try_clone()?),
            LinkStreamInner::Tcp(stream) => LinkStreamInner::Tcp(stream.try_clone()?),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => LinkStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self { inner })
    }

    /// Set read timeout on the underlying link.
    ///
    /// `None` blocks until data arrives.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying link.
    ///
    /// Serial ports use their read timeout for writes as well; this is ignored there.
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(_) => Ok(()),
            LinkStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Link kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            LinkStreamInner::Serial(_) => "serial",
            LinkStreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => "unix",
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("kind", &self.kind())
            .finish()
    }
}
