use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_SESSION_HOURS: u64 = 720;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Session lifetime granted at sign-in, in hours. 0 = never expire.
    pub session_hours: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("quill.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_hours: DEFAULT_SESSION_HOURS,
        }
    }
}
