//! HTTP service command.

use std::path::Path;
use tokio::runtime::Runtime;

use crate::{config, server};

/// Run the HTTP service until Ctrl-C
pub fn cmd_serve(
    rt: &Runtime,
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = config::resolve(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    rt.block_on(server::serve(&config))
}
