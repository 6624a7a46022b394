use std::fmt;
use std::net::TcpStream;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Where the controller link lives.
///
/// Parsed from the strings accepted on the command line:
///
/// | form | link |
/// |---|---|
/// | `tcp:HOST:PORT` | TCP connection (serial-over-network bridges) |
/// | `unix:PATH` | Unix domain socket |
/// | `serial:PATH` or a bare `PATH` | serial tty, e.g. `/dev/ttyACM0` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAddress {
    Serial(PathBuf),
    Tcp(String),
    Unix(PathBuf),
}

impl LinkAddress {
    /// Device the controller enumerates as when plugged in over USB.
    pub const DEFAULT_SERIAL_PORT: &'static str = "/dev/ttyACM0";

    /// Open the link.
    pub fn open(&self, serial: &SerialConfig) -> Result<LinkStream> {
        match self {
            LinkAddress::Serial(path) => crate::serial::SerialStream::open(path, serial),
            LinkAddress::Tcp(address) => {
                let stream =
                    TcpStream::connect(address.as_str()).map_err(|source| TransportError::Connect {
                        address: address.clone(),
                        source,
                    })?;
                stream.set_nodelay(true)?;
                info!(%address, "connected to tcp link");
                Ok(LinkStream::from_tcp(stream))
            }
            #[cfg(unix)]
            LinkAddress::Unix(path) => crate::uds::UnixDomainSocket::connect(path),
            #[cfg(not(unix))]
            LinkAddress::Unix(_) => Err(TransportError::Unsupported("unix socket")),
        }
    }
}

impl Default for LinkAddress {
    fn default() -> Self {
        LinkAddress::Serial(PathBuf::from(Self::DEFAULT_SERIAL_PORT))
    }
}

impl FromStr for LinkAddress {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TransportError::InvalidAddress(
                "address must not be empty".to_string(),
            ));
        }

        if let Some(rest) = input.strip_prefix("tcp:") {
            let has_port = rest
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !has_port {
                return Err(TransportError::InvalidAddress(format!(
                    "expected tcp:HOST:PORT, got {input}"
                )));
            }
            return Ok(LinkAddress::Tcp(rest.to_string()));
        }

        if let Some(rest) = input.strip_prefix("unix:") {
            return non_empty_path(rest, input).map(LinkAddress::Unix);
        }

        if let Some(rest) = input.strip_prefix("serial:") {
            return non_empty_path(rest, input).map(LinkAddress::Serial);
        }

        Ok(LinkAddress::Serial(PathBuf::from(input)))
    }
}

impl fmt::Display for LinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkAddress::Serial(path) => write!(f, "{}", path.display()),
            LinkAddress::Tcp(address) => write!(f, "tcp:{address}"),
            LinkAddress::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

fn non_empty_path(rest: &str, input: &str) -> Result<PathBuf> {
    if rest.is_empty() {
        return Err(TransportError::InvalidAddress(format!(
            "missing path in {input}"
        )));
    }
    Ok(PathBuf::from(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_path_is_serial() {
        let addr: LinkAddress = "/dev/ttyUSB0".parse().unwrap();
        assert_eq!(addr, LinkAddress::Serial(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(addr.to_string(), "/dev/ttyUSB0");
    }

    #[test]
    fn prefixed_forms() {
        assert_eq!(
            "tcp:192.168.4.1:2000".parse::<LinkAddress>().unwrap(),
            LinkAddress::Tcp("192.168.4.1:2000".to_string())
        );
        assert_eq!(
            "unix:/tmp/robot.sock".parse::<LinkAddress>().unwrap(),
            LinkAddress::Unix(PathBuf::from("/tmp/robot.sock"))
        );
        assert_eq!(
            "serial:/dev/ttyACM1".parse::<LinkAddress>().unwrap(),
            LinkAddress::Serial(PathBuf::from("/dev/ttyACM1"))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["tcp:localhost:9000", "unix:/tmp/a.sock", "/dev/ttyACM0"] {
            let addr: LinkAddress = text.parse().unwrap();
            assert_eq!(addr.to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!("".parse::<LinkAddress>().is_err());
        assert!("tcp:localhost".parse::<LinkAddress>().is_err());
        assert!("tcp::9000".parse::<LinkAddress>().is_err());
        assert!("tcp:host:notaport".parse::<LinkAddress>().is_err());
        assert!("unix:".parse::<LinkAddress>().is_err());
    }

    #[test]
    fn default_is_usb_acm_device() {
        assert_eq!(LinkAddress::default().to_string(), "/dev/ttyACM0");
    }

    #[test]
    fn tcp_link_connects_and_reports_kind() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || listener.accept().map(|_| ()));

        let addr: LinkAddress = format!("tcp:127.0.0.1:{port}").parse().unwrap();
        let stream = addr.open(&SerialConfig::default()).unwrap();
        assert_eq!(stream.kind(), "tcp");

        handle.join().unwrap().unwrap();
    }

    #[test]
    fn cloned_link_writes_to_the_same_connection() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            let (mut peer, _) = listener.accept()?;
            let mut buf = [0u8; 3];
            peer.read_exact(&mut buf)?;
            Ok::<_, std::io::Error>(buf)
        });

        let addr: LinkAddress = format!("tcp:127.0.0.1:{port}").parse().unwrap();
        let stream = addr.open(&SerialConfig::default()).unwrap();
        let mut writer = stream.try_clone().unwrap();
        writer.write_all(b"abc").unwrap();

        assert_eq!(&handle.join().unwrap().unwrap(), b"abc");
        drop(stream);
    }
}
