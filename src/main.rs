use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use arcweld::{
    default_config_path, init_logging, ArcWelder, ProgressControl, WelderConfig, WelderProgress,
    BUILD_DATE, VERSION,
};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "arcweld",
    version,
    about = "Welds runs of G0/G1 segments into G2/G3 arcs"
)]
struct Cli {
    /// G-code file to read
    source: PathBuf,

    /// File to write, defaults to `<source>.aw.gcode`
    target: Option<PathBuf>,

    /// Configuration file (TOML or JSON), defaults to the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum path deviation in mm
    #[arg(short, long)]
    resolution: Option<f64>,

    /// Minimum arc radius in mm
    #[arg(long)]
    min_radius: Option<f64>,

    /// Maximum arc radius in mm
    #[arg(long)]
    max_radius: Option<f64>,

    /// G90/G91 also switch the extruder mode
    #[arg(short = 'g', long)]
    g90_influences_extruder: bool,

    /// Maximum buffered commands per arc
    #[arg(short, long)]
    buffer_size: Option<usize>,

    /// Seconds between progress reports
    #[arg(short, long)]
    progress_seconds: Option<f64>,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    save_config: bool,

    /// Print the results as JSON and log in JSON lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => default_config_path().context("Unable to locate the config directory"),
        }
    }

    fn target_path(&self) -> PathBuf {
        self.target
            .clone()
            .unwrap_or_else(|| self.source.with_extension("aw.gcode"))
    }

    /// Overlay command line flags on a loaded configuration
    fn apply(&self, config: &mut WelderConfig) {
        if let Some(resolution) = self.resolution {
            config.resolution_mm = resolution;
        }
        if let Some(min_radius) = self.min_radius {
            config.min_radius_mm = min_radius;
        }
        if let Some(max_radius) = self.max_radius {
            config.max_radius_mm = max_radius;
        }
        if self.g90_influences_extruder {
            config.g90_g91_influences_extruder = true;
        }
        if let Some(buffer_size) = self.buffer_size {
            config.buffer_size = buffer_size;
        }
        if let Some(seconds) = self.progress_seconds {
            config.notification_period_seconds = seconds;
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WelderConfig> {
    let path = cli.config_path()?;
    let mut config = if cli.config.is_some() {
        WelderConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        WelderConfig::load_or_default(&path)?
    };
    cli.apply(&mut config);
    config.validate().context("Invalid welding settings")?;

    if cli.save_config {
        config
            .save_to_file(&path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        info!("Saved configuration to {}", path.display());
    }
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = load_config(cli)?;
    let target = cli.target_path();
    info!("arcweld {} (built {})", VERSION, BUILD_DATE);

    let welder = ArcWelder::new(config);
    let mut observer = |progress: &WelderProgress| {
        info!("{}", progress);
        ProgressControl::Continue
    };
    let results = welder.process(&cli.source, &target, &mut observer);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_summary(&target, &results.message, &results.progress);
    }
    Ok(results.success)
}

fn print_summary(target: &Path, message: &str, progress: &WelderProgress) {
    println!("{}", message);
    println!("Target: {}", target.display());
    println!("{}", progress);
    print!("{}", progress.detail());
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.json) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
