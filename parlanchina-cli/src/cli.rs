use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "parlanchina",
    version,
    about = "Chat engine with MCP tool orchestration, served over HTTP"
)]
pub struct Cli {
    /// Settings file (defaults to config/settings.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bind address (overrides the settings file)
    #[arg(long)]
    pub addr: Option<SocketAddr>,

    /// Tool-server document (overrides the settings file)
    #[arg(long)]
    pub mcp_config: Option<PathBuf>,
}
