//! Latch Engine Runtime
//!
//! Boots the asset catalog and drives hot reload from a fixed-rate tick.
//!
//! Usage: `latch [config.json]`. Without an argument `latch_assets.json` in
//! the working directory is used when present, otherwise the defaults.

use anyhow::{Context, Result};
use latch_asset::{AssetKind, AssetRegistry, CatalogConfig};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_CONFIG: &str = "latch_assets.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    tracing::info!("Latch Engine v{}", latch_core::VERSION);

    let config = load_config(std::env::args().nth(1).map(PathBuf::from))?;
    let mut registry = AssetRegistry::with_default_handlers(&config);

    // Watch before scanning so writes landing mid-scan are queued.
    if config.watch {
        registry
            .start_watching()
            .context("failed to start asset watcher")?;
    }
    registry.scan_folders();

    for kind in AssetKind::ALL {
        tracing::info!("{:>8}: {}", kind, registry.store().count(kind));
    }

    if !config.watch {
        tracing::info!("Watching disabled, exiting after initial scan");
        return Ok(());
    }
    run(&mut registry, config.tick_hz)
}

fn load_config(explicit: Option<PathBuf>) -> Result<CatalogConfig> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => {
            tracing::info!("No {} found, using default asset folders", DEFAULT_CONFIG);
            return Ok(CatalogConfig::default());
        }
    };

    let config = CatalogConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn run(registry: &mut AssetRegistry, tick_hz: u32) -> Result<()> {
    let tick = Duration::from_secs(1) / tick_hz.max(1);
    tracing::info!("Entering tick loop at {} Hz", tick_hz.max(1));

    let mut next = Instant::now();
    loop {
        let report = registry.process_changes();
        if !report.is_empty() {
            tracing::info!(
                "Hot reload: {} new, {} reloaded, {} failed, {} unhandled",
                report.registered,
                report.reloaded,
                report.failed,
                report.unhandled
            );
        }

        next += tick;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            // fell behind, don't try to catch up
            next = now;
        }
    }
}
