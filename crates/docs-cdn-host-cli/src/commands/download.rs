use super::race::fastest;
use anyhow::{Context, Result};
use docs_cdn_host::{CdnCatalog, ProbeOptions, Prober, RaceConfig};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// What a download run did
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The directory already holds a Swagger UI bundle
    Skipped(PathBuf),
    /// Files written with their sizes, failed URLs left out
    Written(Vec<(PathBuf, usize)>),
}

pub async fn handle(dir: &Path, catalog: &CdnCatalog, config: &RaceConfig) -> Result<()> {
    match download(dir, catalog, config).await? {
        Outcome::Skipped(existing) => {
            println!("{} already exists. abort!", existing.display());
        }
        Outcome::Written(files) => {
            for (path, size) in files {
                println!("Write to {} with size={size}", path.display());
            }
            println!("Done.");
        }
    }
    Ok(())
}

/// Fetch the assets of the fastest host into `dir`
pub async fn download(dir: &Path, catalog: &CdnCatalog, config: &RaceConfig) -> Result<Outcome> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;
        info!("Directory {} created.", dir.display());
    } else if let Some(existing) = existing_bundle(dir).await? {
        return Ok(Outcome::Skipped(existing));
    }

    let prober = Prober::from_config(config)?;
    let urls = fastest(catalog, config, &prober).await?;
    info!("Fetching assets from {}", urls.css);

    let targets = vec![urls.js, urls.css, urls.redoc];
    let bodies = prober
        .fetch_all(&targets, &ProbeOptions::from_config(config))
        .await;
    let mut written = Vec::new();
    for (url, body) in targets.iter().zip(bodies) {
        if body.is_empty() {
            warn!("Failed to fetch content from {url}");
            continue;
        }
        let name = url.rsplit('/').next().unwrap_or(url.as_str());
        let path = dir.join(name);
        fs::write(&path, &body)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        written.push((path, body.len()));
    }
    Ok(Outcome::Written(written))
}

/// First `swagger-ui*.js` directly inside `dir`
async fn existing_bundle(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("swagger-ui") && name.ends_with(".js") {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
