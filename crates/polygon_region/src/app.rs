//! Main application logic and lifecycle management.
//!
//! `Application` owns the region engine for the lifetime of the process: it
//! loads regions at startup, saves them periodically and on shutdown, and
//! reports engine health while running.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::signals::{wait_for_shutdown_signal, wait_for_shutdown_signal_silent};
use region_engine::{LoadFailurePolicy, RegionEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct Application {
    config: AppConfig,
    engine: Arc<RegionEngine>,
}

impl Application {
    /// Merges CLI overrides into `config`, validates it and loads the engine.
    pub async fn new(args: &CliArgs, mut config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(regions_path) = &args.regions_path {
            config.storage.path = regions_path.to_string_lossy().to_string();
        }

        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        let mut engine_config = config.to_engine_config();
        if args.check {
            // Check mode always reports decode errors.
            engine_config.load_failure = LoadFailurePolicy::Abort;
        }

        let engine = tokio::task::spawn_blocking(move || RegionEngine::init(engine_config)).await??;

        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }

    /// Logs what was loaded and returns without starting background tasks.
    pub fn check(&self) {
        let stats = self.engine.store().stats();
        let regions = self.engine.store().regions();
        let total_area: f64 = regions.iter().map(|region| region.polygon.area()).sum();

        info!(
            "✅ Region file {} is valid",
            self.engine.file().path().display()
        );
        info!("  - Regions: {}", stats.regions);
        info!("  - Total area: {:.1} blocks²", total_area);
        for region in &regions {
            info!(
                "  - {} | {} vertices | priority {} | {} flags",
                region.key,
                region.polygon.len(),
                region.priority,
                region.flags.len()
            );
        }
    }

    /// Runs until a shutdown signal arrives, then saves and exits.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        display_banner();
        self.log_configuration_summary();

        let autosave_handle = self.spawn_autosave();
        let monitoring_handle = self.spawn_health_monitor();

        info!("✅ Region host is now running!");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown_signal().await?;

        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_signal_silent().await {
                error!("Failed to set up forced shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown signal received again, exiting without saving.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        for handle in [autosave_handle, monitoring_handle].into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }

        let query_stats = self.engine.query().stats();
        info!("📊 Final Statistics:");
        info!("  - Regions: {}", self.engine.store().len());
        info!("  - Queries served: {}", query_stats.total_queries);
        info!("  - Queries inside a region: {}", query_stats.total_hits);

        match Arc::try_unwrap(self.engine) {
            Ok(engine) => tokio::task::spawn_blocking(move || engine.shutdown()).await??,
            Err(shared) => {
                warn!("⚠️ Engine still shared at shutdown, saving without releasing it");
                tokio::task::spawn_blocking(move || shared.save()).await??
            }
        }

        info!("✅ Region host shutdown complete");
        Ok(())
    }

    fn spawn_autosave(&self) -> Option<JoinHandle<()>> {
        let interval_secs = self.config.storage.autosave_interval_secs;
        if interval_secs == 0 {
            info!("💾 Autosave disabled");
            return None;
        }

        let engine = self.engine.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            // The first tick fires immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let engine = engine.clone();
                match tokio::task::spawn_blocking(move || engine.save()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("❌ Autosave failed: {}", e),
                    Err(e) => error!("❌ Autosave task panicked: {}", e),
                }
            }
        }))
    }

    fn spawn_health_monitor(&self) -> Option<JoinHandle<()>> {
        let interval_secs = self.config.monitoring.health_interval_secs;
        if interval_secs == 0 {
            return None;
        }

        let engine = self.engine.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            let mut last_queries = 0u64;

            loop {
                interval.tick().await;

                let stats = engine.query().stats();
                let store_stats = engine.store().stats();
                let queries_this_period = stats.total_queries - last_queries;
                last_queries = stats.total_queries;

                info!(
                    "📊 Region Health - {} regions | {} queries this period | {} selections open",
                    store_stats.regions,
                    queries_this_period,
                    engine.selections().session_count()
                );
            }
        }))
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  💾 Region file: {}", self.config.storage.path);
        info!(
            "  ⏱️ Autosave interval: {}s",
            self.config.storage.autosave_interval_secs
        );
        info!(
            "  📏 Default vertical bounds: {} to {}",
            self.config.regions.min_y, self.config.regions.max_y
        );
        info!(
            "  🚩 Default flags: {}",
            self.config
                .regions
                .flags
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
