//! Training configuration: render size, sampling effort, and optimizer
//! hyperparameters.
//!
//! Load from environment via [`from_env`] and validate with
//! [`TrainConfig::validate`] before use.

mod builder;
mod error;

use std::path::PathBuf;

pub use builder::from_env;
pub use error::ConfigError;

/// Central configuration for the training binary.
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Seed for the renderer's PRNG (reproducibility).
    pub seed: u64,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Samples per pixel.
    pub spp: usize,
    /// Maximum path depth.
    pub depth: u32,

    /// Number of optimization iterations.
    pub iterations: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// L2 regularization coefficient.
    pub weight_decay: f64,

    /// Print the loss every this many iterations (and at the first).
    pub loss_log_every: usize,
    /// Save a PPM snapshot every this many iterations.
    pub snapshot_every: usize,
    /// Directory for target and snapshot images.
    pub output_dir: PathBuf,
}

impl TrainConfig {
    /// Returns the default configuration (suitable for tests and
    /// fallbacks).
    ///
    /// The tape for a whole frame stays alive until the backward pass, so
    /// the defaults keep the per-frame sample budget modest; raise the
    /// resolution and spp together with available memory.
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            seed: 5489,
            width: 32,
            height: 32,
            spp: 16,
            depth: 8,
            iterations: 100,
            learning_rate: 0.1,
            weight_decay: 0.01,
            loss_log_every: 1,
            snapshot_every: 10,
            output_dir: PathBuf::from("imgs"),
        }
    }

    /// Validates the configuration: positive dimensions and sampling
    /// effort, a positive learning rate, and non-negative weight decay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.spp == 0 {
            return Err(ConfigError::Validation(
                "spp must be at least 1".to_string(),
            ));
        }
        if self.depth == 0 {
            return Err(ConfigError::Validation(
                "depth must be at least 1".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(ConfigError::Validation(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(ConfigError::Validation(format!(
                "weight decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if self.loss_log_every == 0 || self.snapshot_every == 0 {
            return Err(ConfigError::Validation(
                "log and snapshot intervals must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
