//! Client configuration.

use std::path::PathBuf;

/// Endpoints and file locations for a client instance.
///
/// Built from command-line arguments by the binary; [`Default`] matches a
/// backend running locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the event socket (`http(s)://host:port`).
    pub server_url: String,
    /// Base URL of the REST API.
    pub api_url: String,
    /// File holding the persisted identity.
    pub session_path: PathBuf,
}

impl ClientConfig {
    /// Default session file: `<config dir>/darkchat/session.cbor`.
    ///
    /// Falls back to the working directory when the platform has no config
    /// directory.
    pub fn default_session_path() -> PathBuf {
        dirs::config_dir()
            .map_or_else(|| PathBuf::from("."), |dir| dir.join("darkchat"))
            .join("session.cbor")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:80".to_owned(),
            api_url: "http://localhost:3000".to_owned(),
            session_path: Self::default_session_path(),
        }
    }
}
