//! One-shot download and catalog search commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::catalog::{CatalogApi, CatalogClient};
use crate::error::FetchError;
use crate::pipeline::Pipeline;
use crate::{config, net};

/// Run the full pipeline for one track
pub fn cmd_download(
    rt: &Runtime,
    config_path: Option<&Path>,
    track_id: &str,
    output: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let mut config = config::resolve(config_path)?;
    if let Some(dir) = output {
        config.output.dir = dir.clone();
    }

    rt.block_on(async {
        let http_client = net::build_client(&config.network)?;
        let pipeline = Pipeline::from_config(&config, http_client)?;

        println!("Fetching {}...", track_id);
        match pipeline.run(track_id).await {
            Ok(file) => {
                println!("✓ {}", file.path.display());
                Ok(())
            }
            Err(failure) => {
                eprintln!("✗ {} ({})", failure, failure.cause.code());
                if matches!(&failure.cause, FetchError::Upstream(m) if m.contains("yt-dlp not found")) {
                    super::print_tool_install_instructions();
                }
                Err(failure.into())
            }
        }
    })
}

/// Search the catalog and print matching tracks
pub fn cmd_search(
    rt: &Runtime,
    config_path: Option<&Path>,
    query: &str,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let config = config::resolve(config_path)?;

    rt.block_on(async {
        let http_client = net::build_client(&config.network)?;
        let (Some(id), Some(secret)) = (
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
        ) else {
            anyhow::bail!("CLIENT_ID and CLIENT_SECRET are required");
        };
        let catalog: Arc<dyn CatalogApi> = Arc::new(CatalogClient::new(http_client, id, secret));

        let results = catalog.search(query).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        let rows = summarize(&results, limit);
        if rows.is_empty() {
            println!("No tracks found for {:?}", query);
        }
        for row in rows {
            println!("{}", row);
        }
        Ok(())
    })
}

/// `"<id>  <artists> - <title> (<album>)"` lines from a raw search response
fn summarize(results: &serde_json::Value, limit: usize) -> Vec<String> {
    let Some(items) = results.pointer("/tracks/items").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .take(limit)
        .filter_map(|item| {
            let id = item.get("id")?.as_str()?;
            let title = item.get("name")?.as_str()?;
            let artists: Vec<&str> = item
                .get("artists")
                .and_then(|a| a.as_array())
                .map(|a| a.iter().filter_map(|x| x.get("name")?.as_str()).collect())
                .unwrap_or_default();
            let album = item.pointer("/album/name").and_then(|v| v.as_str()).unwrap_or("?");
            Some(format!("{}  {} - {} ({})", id, artists.join(", "), title, album))
        })
        .collect()
}
