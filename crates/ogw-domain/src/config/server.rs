use serde::{Deserialize, Serialize};

/// Transport/listen surface for the gateway binary (ambient — framing itself
/// is out of scope per spec.md Non-goals, this just carries the listen
/// address for the optional HTTP transport).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_transport")]
    pub transport: TransportMode,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: d_transport(),
            host: d_host(),
            port: d_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Stdio,
    Http,
}

fn d_transport() -> TransportMode {
    TransportMode::Stdio
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_port() -> u16 {
    8089
}
