//! CLI-level configuration.
//!
//! Simplified from `faxt::config::Config`: there is no project file or
//! multi-location search here, since fen scripts carry no persisted
//! project config — just the handful of flags [`crate::Cli`] exposes,
//! turned into the [`GcConfig`] the VM actually consumes.

use fengc::GcConfig;

use crate::Cli;

pub(crate) struct Config {
    pub gc: GcConfig,
}

impl Config {
    pub(crate) fn from_cli(cli: &Cli) -> Self {
        let mut gc = GcConfig::default();
        gc.stress_gc = cli.stress_gc;
        if let Some(threshold) = cli.gc_threshold {
            gc.initial_threshold = threshold;
        }
        Self { gc }
    }
}
