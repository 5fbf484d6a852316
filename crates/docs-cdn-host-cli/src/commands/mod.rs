pub mod cache;
pub mod download;
pub mod race;

use anyhow::{Context, Result};
use docs_cdn_host::{CdnCatalog, CdnHostItem, ReferenceHint};

/// Catalog raced by a command
///
/// Without example URLs the built-in CDNs are used. With them, each URL is
/// normalized into a mirror; `extend` appends the built-in CDNs after them.
pub fn catalog(urls: &[String], redoc: Option<&str>, extend: bool) -> Result<CdnCatalog> {
    if urls.is_empty() {
        return Ok(CdnCatalog::builtin());
    }
    let hint = redoc.map_or(ReferenceHint::Official, |path| {
        ReferenceHint::Path(path.to_string())
    });
    let hosts = urls
        .iter()
        .map(|url| {
            CdnHostItem::new(url)
                .with_redoc(hint.clone())
                .export()
                .with_context(|| format!("cannot use {url} as a mirror"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(if extend {
        CdnCatalog::extend(hosts)
    } else {
        CdnCatalog::new(hosts)
    })
}
