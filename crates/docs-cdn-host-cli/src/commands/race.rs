use anyhow::{Context, Result};
use docs_cdn_host::{AssetUrls, CdnCatalog, DocsApp, Prober, RaceConfig, Resolver, UrlCache};
use tracing::info;

pub async fn handle(catalog: &CdnCatalog, config: &RaceConfig, save: bool) -> Result<()> {
    let prober = Prober::from_config(config)?;
    let urls = fastest(catalog, config, &prober).await?;
    println!("css:   {}", urls.css);
    println!("js:    {}", urls.js);
    println!("redoc: {}", urls.redoc);
    if save {
        let cache = UrlCache::locate(config)?;
        cache.store(&urls)?;
        println!("Saved to {}", cache.path().display());
    }
    Ok(())
}

/// Asset URLs on the fastest host of `catalog`, ignoring any cached answer
pub async fn fastest(
    catalog: &CdnCatalog,
    config: &RaceConfig,
    prober: &Prober,
) -> Result<AssetUrls> {
    info!("Comparing response speed of {} hosts", catalog.hosts().len());
    Resolver::new(catalog.clone())
        .with_cache(false)
        .with_config(config.clone())
        .with_prober(prober.clone())
        .resolve_async(&mut DocsApp::default())
        .await?
        .context("no CDN host to race")
}
