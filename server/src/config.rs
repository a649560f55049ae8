use std::net::SocketAddr;
use std::path::PathBuf;

use error_stack::ResultExt;
use vodca::References;

use kernel::KernelError;

const SERVER_PORT: &str = "SERVER_PORT";
const LOG_DIR: &str = "LOG_DIR";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_DIR: &str = "./logs/";

#[derive(Debug, Clone, Eq, PartialEq, References)]
pub struct ServerConfig {
    port: u16,
    log_dir: PathBuf,
}

impl ServerConfig {
    /// Reads the process environment, honouring a `.env` file.
    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> error_stack::Result<Self, KernelError> {
        let port = match lookup(SERVER_PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .change_context_lazy(|| KernelError::Internal)
                .attach_printable_lazy(|| format!("{SERVER_PORT} is not a port number: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let log_dir = lookup(LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        Ok(Self { port, log_dir })
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
