//! CLI argument definitions
//!
//! Every flag is optional and overrides the matching value from the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;

/// Run a demo dispatcher with a pool of hello workers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Work queue capacity
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Delay between submissions of the built-in producer, in milliseconds
    #[arg(long)]
    pub submit_interval_ms: Option<u64>,

    /// Total number of items the feeder may produce
    #[arg(long)]
    pub feeder_budget: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(short, long)]
    pub duration_secs: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String
}

impl Cli {
    /// Overlay command-line values on top of file settings
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(capacity) = self.capacity {
            settings.dispatcher.queue_capacity = capacity;
        }
        if let Some(interval) = self.submit_interval_ms {
            settings.submit_interval_ms = interval;
        }
        if let Some(budget) = self.feeder_budget {
            settings.feeder_budget = Some(budget);
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from(["workpull", "--workers", "2", "--capacity", "50", "--feeder-budget", "7"]);

        let settings = cli.apply(Settings::default());

        assert_eq!(settings.workers, 2);
        assert_eq!(settings.dispatcher.queue_capacity, 50);
        assert_eq!(settings.feeder_budget, Some(7));
        assert_eq!(settings.submit_interval_ms, 10);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_no_flags_keep_settings() {
        let cli = Cli::parse_from(["workpull"]);
        assert_eq!(cli.apply(Settings::default()), Settings::default());
        assert!(cli.duration_secs.is_none());
    }
}
