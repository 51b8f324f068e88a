//! Episode runner wiring a controller to the skirmish simulation

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use commandant_agent::Controller;

use crate::skirmish::{SkirmishConfig, SkirmishSim};

/// Initialize structured logging from the `RUST_LOG` environment variable
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Drive the controller through `episodes` full skirmish matches
///
/// Each match runs tick by tick until the simulation reports an outcome; the
/// terminal observation is handed to the controller so it can learn, persist
/// and roll over before the next match starts.
///
/// # Errors
///
/// Currently infallible at this layer; the signature leaves room for engine
/// transports that can fail mid-episode.
pub fn run_episodes(
    agent: &mut Controller,
    config: &SkirmishConfig,
    episodes: u32,
) -> Result<()> {
    for _ in 0..episodes {
        let mut sim = SkirmishSim::new(config.clone());
        let mut obs = sim.observe();
        loop {
            let command = agent.step(&obs);
            if obs.is_terminal() {
                break;
            }
            obs = sim.step(command);
        }
    }
    Ok(())
}
