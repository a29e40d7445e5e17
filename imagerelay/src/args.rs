use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Image generation relay
#[derive(Debug, Parser)]
#[command(name = "imagerelay", about = "Relay text prompts to a hosted image generation model")]
pub struct Args {
    /// Path to a configuration file; built-in defaults apply when omitted
    #[arg(short, long, env = "IMAGERELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "IMAGERELAY_LISTEN")]
    pub listen: Option<SocketAddr>,
}
