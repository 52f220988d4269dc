//! Build the training configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use super::error::ConfigError;
use super::TrainConfig;

/// Environment variable prefix (e.g. `DIFFTRACE_SPP`).
pub(crate) const ENV_PREFIX: &str = "DIFFTRACE_";

/// Builds [`TrainConfig`] from environment variables, falling back to
/// [`TrainConfig::default_config`] for unset values.
///
/// Environment variables (all optional):
/// `DIFFTRACE_SEED`, `DIFFTRACE_WIDTH`, `DIFFTRACE_HEIGHT`, `DIFFTRACE_SPP`,
/// `DIFFTRACE_DEPTH`, `DIFFTRACE_ITERATIONS`, `DIFFTRACE_LEARNING_RATE`,
/// `DIFFTRACE_WEIGHT_DECAY`, `DIFFTRACE_LOSS_LOG_EVERY`,
/// `DIFFTRACE_SNAPSHOT_EVERY`, `DIFFTRACE_OUTPUT_DIR`.
///
/// A variable that is set but does not parse is an error, not a silent
/// fallback.
pub fn from_env() -> Result<TrainConfig, ConfigError> {
    let default = TrainConfig::default_config();
    Ok(TrainConfig {
        seed: env_parsed("SEED", default.seed)?,
        width: env_parsed("WIDTH", default.width)?,
        height: env_parsed("HEIGHT", default.height)?,
        spp: env_parsed("SPP", default.spp)?,
        depth: env_parsed("DEPTH", default.depth)?,
        iterations: env_parsed("ITERATIONS", default.iterations)?,
        learning_rate: env_parsed("LEARNING_RATE", default.learning_rate)?,
        weight_decay: env_parsed("WEIGHT_DECAY", default.weight_decay)?,
        loss_log_every: env_parsed("LOSS_LOG_EVERY", default.loss_log_every)?,
        snapshot_every: env_parsed("SNAPSHOT_EVERY", default.snapshot_every)?,
        output_dir: std::env::var(concat_env("OUTPUT_DIR"))
            .map(PathBuf::from)
            .unwrap_or(default.output_dir),
    })
}

fn env_parsed<T: FromStr>(suffix: &str, default: T) -> Result<T, ConfigError> {
    let key = concat_env(suffix);
    match std::env::var(&key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Parse { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn concat_env(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}
