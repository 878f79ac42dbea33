//! Logical server names and their resolution to transport endpoints.
//!
//! The call engine and the dispatch code never assume a socket family;
//! they work against [`Endpoint`] values produced by a [`Resolver`]. The
//! default resolver maps plain names to Unix sockets under a well-known
//! directory and `tcp://host:port` names to TCP, keeping the transport
//! pluggable.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::protocol::error::{PeercallError, Result};

/// Scheme prefix selecting the TCP endpoint family.
pub const TCP_SCHEME: &str = "tcp://";

/// Environment variable overriding the socket directory.
pub const SOCKET_DIR_ENV: &str = "PEERCALL_SOCKET_DIR";

/// A resolved transport endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A Unix domain socket path.
    Unix(PathBuf),
    /// A TCP address in `host:port` form.
    Tcp(String),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Name → endpoint resolution boundary.
///
/// The contract is exactly "return a usable endpoint or
/// `EndpointNotFound`"; how names are registered is the resolver's own
/// business.
pub trait Resolver: Send + Sync {
    /// Resolves a name for a client about to connect. Fails with
    /// `EndpointNotFound` when no server is registered under `name`.
    fn resolve(&self, name: &str) -> Result<Endpoint>;

    /// Resolves a name for a server about to bind, creating whatever the
    /// endpoint needs to exist (e.g. the socket directory).
    fn bind_endpoint(&self, name: &str) -> Result<Endpoint>;
}

/// Default resolver: a directory of named Unix sockets.
///
/// Plain names map to `<dir>/<name>.sock`; a missing socket file means no
/// server is registered under that name. Names starting with `tcp://` map
/// to TCP addresses verbatim, for peers that are not local.
///
/// The directory is `$PEERCALL_SOCKET_DIR`, else
/// `$XDG_RUNTIME_DIR/peercall`, else `<tmp>/peercall`.
#[derive(Debug, Clone)]
pub struct SocketDirResolver {
    dir: PathBuf,
}

impl SocketDirResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SocketDirResolver { dir: dir.into() }
    }

    /// Builds the resolver from the environment (see the type docs for
    /// the lookup order).
    pub fn from_env() -> Self {
        let dir = std::env::var_os(SOCKET_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("XDG_RUNTIME_DIR").map(|d| PathBuf::from(d).join("peercall"))
            })
            .unwrap_or_else(|| std::env::temp_dir().join("peercall"));
        SocketDirResolver { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn socket_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.len() > 64 || !name.bytes().all(is_name_byte) {
            return Err(PeercallError::Connection(format!(
                "invalid server name '{name}'"
            )));
        }
        Ok(self.dir.join(format!("{name}.sock")))
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.'
}

impl Resolver for SocketDirResolver {
    fn resolve(&self, name: &str) -> Result<Endpoint> {
        if let Some(addr) = name.strip_prefix(TCP_SCHEME) {
            return Ok(Endpoint::Tcp(addr.to_string()));
        }
        let path = self.socket_path(name)?;
        if !path.exists() {
            return Err(PeercallError::EndpointNotFound(name.to_string()));
        }
        Ok(Endpoint::Unix(path))
    }

    fn bind_endpoint(&self, name: &str) -> Result<Endpoint> {
        if let Some(addr) = name.strip_prefix(TCP_SCHEME) {
            return Ok(Endpoint::Tcp(addr.to_string()));
        }
        let path = self.socket_path(name)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PeercallError::Connection(format!(
                "failed to create socket directory {}: {e}",
                self.dir.display()
            ))
        })?;
        Ok(Endpoint::Unix(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_names_resolve_verbatim() {
        let resolver = SocketDirResolver::new("/nonexistent");
        let endpoint = resolver.resolve("tcp://127.0.0.1:9001").unwrap();
        assert_eq!(endpoint, Endpoint::Tcp("127.0.0.1:9001".into()));
    }

    #[test]
    fn test_missing_socket_is_endpoint_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SocketDirResolver::new(dir.path());
        let err = resolver.resolve("nobody-home").unwrap_err();
        assert!(matches!(err, PeercallError::EndpointNotFound(name) if name == "nobody-home"));
    }

    #[test]
    fn test_registered_socket_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ptyd.sock");
        std::fs::write(&path, b"").unwrap();
        let resolver = SocketDirResolver::new(dir.path());
        assert_eq!(resolver.resolve("ptyd").unwrap(), Endpoint::Unix(path));
    }

    #[test]
    fn test_bind_endpoint_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deeper");
        let resolver = SocketDirResolver::new(&nested);
        let endpoint = resolver.bind_endpoint("ptyd").unwrap();
        assert!(nested.is_dir());
        assert_eq!(endpoint, Endpoint::Unix(nested.join("ptyd.sock")));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let resolver = SocketDirResolver::new("/tmp");
        assert!(resolver.resolve("").is_err());
        assert!(resolver.resolve("../escape").is_err());
        assert!(resolver.resolve("a/b").is_err());
        assert!(resolver.resolve(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(
            Endpoint::Unix(PathBuf::from("/run/peercall/ptyd.sock")).to_string(),
            "unix:/run/peercall/ptyd.sock"
        );
        assert_eq!(
            Endpoint::Tcp("localhost:9001".into()).to_string(),
            "tcp://localhost:9001"
        );
    }
}
