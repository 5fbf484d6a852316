use crate::CacheCommands;
use anyhow::Result;
use docs_cdn_host::{RaceConfig, UrlCache};

pub fn handle(cmd: CacheCommands, config: &RaceConfig) -> Result<()> {
    let cache = UrlCache::locate(config)?;
    match cmd {
        CacheCommands::Show => {
            println!("Cache file: {}", cache.path().display());
            match cache.load()? {
                Some(urls) => {
                    for url in urls.cacheable() {
                        println!("  {url}");
                    }
                }
                None => println!("  (no cached URLs)"),
            }
        }
        CacheCommands::Clear => {
            if cache.clear()? {
                println!("Removed {}", cache.path().display());
            } else {
                println!("Nothing to remove at {}", cache.path().display());
            }
        }
    }
    Ok(())
}
