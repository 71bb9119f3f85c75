use std::path::PathBuf;

use clap::Parser;

/// Command-line flags. Every value overrides the matching setting from `--config`.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "snake-hazards")]
#[command(about = "Drive the obstacle engine headlessly with a scripted snake")]
pub(crate) struct CliArgs {
    /// TOML file with grid, run, lifetime, difficulty, worker and generator settings
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    pub(crate) columns: Option<u32>,

    /// Grid height in cells
    #[arg(long)]
    pub(crate) rows: Option<u32>,

    /// Number of frames to simulate
    #[arg(long)]
    pub(crate) ticks: Option<u64>,

    /// Simulated frame length in milliseconds
    #[arg(long)]
    pub(crate) tick_ms: Option<u64>,

    /// Difficulty level applied before the first frame
    #[arg(long)]
    pub(crate) difficulty: Option<u32>,

    /// Seed for spawning, generation and food placement
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Static obstacles generated at the start of every round
    #[arg(long)]
    pub(crate) prepopulate_static: Option<usize>,

    /// Moving obstacles generated at the start of every round
    #[arg(long)]
    pub(crate) prepopulate_moving: Option<usize>,

    /// Sleep for each frame and let the background worker decay lifetimes
    #[arg(long)]
    pub(crate) realtime: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_into_overrides() {
        let args = CliArgs::try_parse_from([
            "snake-hazards",
            "--columns",
            "30",
            "--rows",
            "20",
            "--ticks",
            "500",
            "--prepopulate-moving",
            "4",
            "--realtime",
        ])
        .expect("valid flags");
        assert_eq!(args.columns, Some(30));
        assert_eq!(args.rows, Some(20));
        assert_eq!(args.ticks, Some(500));
        assert_eq!(args.prepopulate_moving, Some(4));
        assert_eq!(args.prepopulate_static, None);
        assert!(args.realtime);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(CliArgs::try_parse_from(["snake-hazards", "--speed", "3"]).is_err());
    }
}
