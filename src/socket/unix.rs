//! Unix-domain stream connector.
//!
//! The boundary hands the raw descriptor to the caller, so failures are
//! reported as negative sentinels rather than errors.

use std::io;
use std::path::Path;

/// Unclassified failure.
pub const ERR_GENERIC: i32 = -1;
/// Unix-domain sockets are not available on this platform.
pub const ERR_UNSUPPORTED: i32 = -2;
/// Null, empty, non-UTF-8 or over-long path, or a negative handle.
pub const ERR_INVALID_ARGUMENT: i32 = -3;
pub const ERR_NOT_FOUND: i32 = -4;
pub const ERR_PERMISSION_DENIED: i32 = -5;
/// The path exists but nothing is listening on it.
pub const ERR_CONNECTION_REFUSED: i32 = -6;
/// The path exists and is not a socket.
pub const ERR_NOT_A_SOCKET: i32 = -7;

/// Map a connect failure onto its sentinel.
pub fn sentinel_for(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::InvalidInput => ERR_INVALID_ARGUMENT,
        io::ErrorKind::NotFound => ERR_NOT_FOUND,
        io::ErrorKind::PermissionDenied => ERR_PERMISSION_DENIED,
        io::ErrorKind::ConnectionRefused => ERR_CONNECTION_REFUSED,
        io::ErrorKind::Unsupported => ERR_UNSUPPORTED,
        _ => ERR_GENERIC,
    }
}

#[cfg(unix)]
mod imp {
    use super::*;
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::io::{FromRawFd, IntoRawFd, OwnedFd, RawFd};
    use std::os::unix::net::UnixStream;

    pub fn connect(path: &Path) -> io::Result<UnixStream> {
        if path.as_os_str().is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty socket path"));
        }
        // Linux reports ECONNREFUSED for regular files; check the type first.
        if let Ok(meta) = std::fs::metadata(path) {
            if !meta.file_type().is_socket() {
                return Err(io::Error::other(NotASocket(path.display().to_string())));
            }
        }
        UnixStream::connect(path)
    }

    pub fn into_raw(stream: UnixStream) -> RawFd {
        stream.into_raw_fd()
    }

    /// # Safety
    /// `fd` must be an open descriptor owned by the caller.
    pub unsafe fn close(fd: RawFd) {
        drop(OwnedFd::from_raw_fd(fd));
    }
}

#[cfg(not(unix))]
mod imp {
    use super::*;

    pub fn connect(_path: &Path) -> io::Result<std::convert::Infallible> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix-domain sockets are not supported on this platform",
        ))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0} is not a socket")]
struct NotASocket(String);

fn is_not_a_socket(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<NotASocket>())
}

/// Connect to the socket at `path`.
#[cfg(unix)]
pub fn connect(path: impl AsRef<Path>) -> io::Result<std::os::unix::net::UnixStream> {
    imp::connect(path.as_ref())
}

/// Connect to the socket at `path` and hand over the raw descriptor.
///
/// Returns a non-negative descriptor owned by the caller, or one of the
/// `ERR_*` sentinels.
pub fn connect_raw(path: &str) -> i32 {
    #[cfg(unix)]
    {
        match imp::connect(Path::new(path)) {
            Ok(stream) => {
                let fd = imp::into_raw(stream);
                tracing::debug!(path, fd, "unix socket connected");
                fd
            }
            Err(e) => {
                tracing::debug!(path, error = %e, "unix socket connect failed");
                if is_not_a_socket(&e) {
                    ERR_NOT_A_SOCKET
                } else {
                    sentinel_for(&e)
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        match imp::connect(Path::new(path)) {
            Ok(never) => match never {},
            Err(e) => sentinel_for(&e),
        }
    }
}

/// Close a descriptor obtained from [`connect_raw`].
///
/// Returns 0, or [`ERR_INVALID_ARGUMENT`] for a negative handle. Closing a
/// descriptor twice, or one not obtained from [`connect_raw`], is undefined.
pub fn close_raw(handle: i32) -> i32 {
    if handle < 0 {
        return ERR_INVALID_ARGUMENT;
    }
    #[cfg(unix)]
    {
        // SAFETY: the caller passes back a descriptor obtained from
        // `connect_raw` that it has not closed yet.
        unsafe { imp::close(handle) };
        0
    }
    #[cfg(not(unix))]
    {
        ERR_UNSUPPORTED
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::os::unix::io::FromRawFd;
    use std::os::unix::net::{UnixListener, UnixStream};

    #[test]
    fn test_connect_raw_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let fd = connect_raw(path.to_str().unwrap());
        assert!(fd >= 0, "got sentinel {fd}");

        let (mut server, _) = listener.accept().unwrap();
        // SAFETY: fd was just handed over by connect_raw
        let mut client = unsafe { UnixStream::from_raw_fd(fd) };
        client.write_all(b"hi").unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hi");
    }

    #[test]
    fn test_close_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("close.sock");
        let _listener = UnixListener::bind(&path).unwrap();

        let fd = connect_raw(path.to_str().unwrap());
        assert!(fd >= 0);
        assert_eq!(close_raw(fd), 0);
        assert_eq!(close_raw(-1), ERR_INVALID_ARGUMENT);
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sock");
        assert_eq!(connect_raw(path.to_str().unwrap()), ERR_NOT_FOUND);
    }

    #[test]
    fn test_not_a_socket() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(connect_raw(file.path().to_str().unwrap()), ERR_NOT_A_SOCKET);
    }

    #[test]
    fn test_nobody_listening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.sock");
        drop(UnixListener::bind(&path).unwrap());
        assert_eq!(connect_raw(path.to_str().unwrap()), ERR_CONNECTION_REFUSED);
    }

    #[test]
    fn test_invalid_paths() {
        assert_eq!(connect_raw(""), ERR_INVALID_ARGUMENT);
        let too_long = format!("/tmp/{}", "x".repeat(200));
        assert_eq!(connect_raw(&too_long), ERR_INVALID_ARGUMENT);
    }

    #[test]
    fn test_sentinel_mapping() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(sentinel_for(&err), ERR_PERMISSION_DENIED);
        let err = io::Error::from(io::ErrorKind::BrokenPipe);
        assert_eq!(sentinel_for(&err), ERR_GENERIC);
    }
}
