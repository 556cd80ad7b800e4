//! Server configuration from flags and environment

use clap::Parser;
use std::net::SocketAddr;

pub const DEFAULT_LOG_FILTER: &str = "santa=debug,tower_http=debug";

#[derive(Debug, Clone, Parser)]
#[command(name = "santa")]
#[command(about = "Secret Santa server - register participants and draw gift assignments")]
#[command(version)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(short, long, env = "SANTA_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Tracing filter used when RUST_LOG is not set
    #[arg(long, env = "SANTA_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}
