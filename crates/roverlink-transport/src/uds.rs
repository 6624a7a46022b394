use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Unix domain socket endpoint.
///
/// Used when the serial device is bridged onto a socket (for example by
/// `socat`) and by controller simulators in tests.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
}

impl UnixDomainSocket {
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on a filesystem-path Unix domain socket.
    ///
    /// A stale socket at `path` is removed first; any other kind of file is left
    /// alone and reported as a bind error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(TransportError::Bind {
                    path,
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(|source| TransportError::Bind {
                path: path.clone(),
                source,
            })?;
        }

        let listener = UnixListener::bind(&path).map_err(|source| TransportError::Bind {
            path: path.clone(),
            source,
        })?;

        info!(?path, "listening on unix domain socket");
        Ok(Self { listener, path })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<LinkStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!("accepted connection");
        Ok(LinkStream::from_unix(stream))
    }

    /// Connect to a listening Unix domain socket (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<LinkStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
            address: path.display().to_string(),
            source,
        })?;
        info!(?path, "connected to unix domain socket");
        Ok(LinkStream::from_unix(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        debug!(path = ?self.path, "cleaning up socket file");
        let _ = std::fs::remove_file(&self.path);
    }
}
