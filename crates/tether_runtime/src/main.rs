//! Tether Runtime
//!
//! Boots logging and settings, then drives a small headless scene through
//! the script runtime hooks.
//!
//! Usage: `tether [settings.json]`

mod demo;

use anyhow::{Context, Result};
use tether_script::headless::HeadlessHost;
use tether_script::{RuntimeSettings, ScriptRuntime};
use tracing_subscriber::EnvFilter;

const FRAME_DELTA: f32 = 1.0 / 60.0;
const DEMO_FRAMES: u32 = 120;

fn main() -> Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => RuntimeSettings::load(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => RuntimeSettings::default(),
    };

    // RUST_LOG wins over the settings file.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Tether Runtime v{}", tether_core::VERSION);

    let mut runtime = ScriptRuntime::new(HeadlessHost::new(), settings)
        .context("failed to start script runtime")?;
    let scene = demo::build(&mut runtime).context("failed to build demo scene")?;

    runtime.play_begin();
    let mut failed = 0;
    for frame in 0..DEMO_FRAMES {
        let report = runtime.frame_update(FRAME_DELTA, 1.0);
        failed += report.failed;
        if frame == DEMO_FRAMES / 2 {
            runtime
                .collision_enter(scene.player, scene.crate_entity, &scene.impact)
                .context("collision payload rejected")?;
        }
    }
    runtime.play_end();

    tracing::info!(
        frames = runtime.clock().frame_count(),
        game_seconds = runtime.clock().scaled_time(),
        failed_callbacks = failed,
        entities = runtime.host().entity_count(),
        "demo finished"
    );
    Ok(())
}
