//! Serve command - run the HTTP API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Args;

use stegsuite::server::Server;
use stegsuite::AppConfig;

use super::CommandExecutor;

/// Start the HTTP API server.
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default from config, 127.0.0.1:5000)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

impl CommandExecutor for ServeCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let mut config = config.clone();
        if let Some(bind) = self.bind {
            config.server.bind_addr = bind;
        }

        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        runtime
            .block_on(Server::new(&config).run())
            .context("Server failed")
    }
}
