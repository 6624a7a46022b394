use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Read timeout standing in for "block until data arrives".
///
/// `serialport` always waits with a timeout, so an unset timeout becomes a long one.
pub const BLOCKING_READ_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Serial tty link configured for 8N1 transfer without flow control.
///
/// A hangup reads as end of stream, the same as a closed socket.
pub struct SerialStream {
    port: Box<dyn SerialPort>,
}

impl SerialStream {
    /// Open and configure a serial device.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<LinkStream> {
        let path = path.as_ref();
        if !config.is_supported() {
            return Err(TransportError::UnsupportedBaudRate(config.baud_rate));
        }

        let port = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(BLOCKING_READ_TIMEOUT)
            .open()
            .map_err(|err| open_error(path, err))?;

        info!(?path, baud = config.baud_rate, "opened serial link");
        Ok(LinkStream::from_serial(Self { port }))
    }

    /// Open a second handle on the same port. Timeouts are per handle.
    pub(crate) fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            port: self.port.try_clone()?,
        })
    }

    pub(crate) fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout = timeout.unwrap_or(BLOCKING_READ_TIMEOUT);
        debug!(?timeout, "serial read timeout");
        self.port.set_timeout(timeout).map_err(io::Error::from)
    }
}

fn open_error(path: &Path, err: serialport::Error) -> TransportError {
    let path = path.to_path_buf();
    match err.kind() {
        serialport::ErrorKind::InvalidInput => TransportError::Configure {
            path,
            source: err.into(),
        },
        _ => TransportError::Open {
            path,
            source: err.into(),
        },
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(0),
            other => other,
        }
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}
