use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use swarmlight::{params, Simulation, SwarmConfig};

/// GPU particle swarm with soft self-shadowing and temporal bloom.
#[derive(Debug, Parser)]
#[command(name = "swarmlight", version, about)]
struct Cli {
    /// TOML file with any subset of the configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed sphere segments; the swarm has (segments + 1)^2 particles.
    #[arg(long)]
    segments: Option<u32>,

    /// Lower-cost profile for touch devices.
    #[arg(long)]
    touch: bool,

    /// Override a tunable, e.g. `--set attraction=20`. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    overrides: Vec<String>,

    /// Start paused.
    #[arg(long)]
    paused: bool,

    /// Start with post-processing off.
    #[arg(long)]
    no_effects: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swarmlight=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SwarmConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SwarmConfig::default(),
    };
    if cli.touch {
        config = config.touch_profile();
    }
    if let Some(segments) = cli.segments {
        config.scene.sphere_segments = segments;
    }
    if cli.no_effects {
        config.compositor.enabled = false;
    }
    for assignment in &cli.overrides {
        let value = params::apply_assignment(&mut config, assignment)
            .with_context(|| format!("applying --set {assignment}"))?;
        tracing::debug!(%assignment, value, "override applied");
    }

    if cli.print_config {
        print!("{}", config.to_toml_string());
        return Ok(());
    }

    Simulation::new()
        .with_config(config)
        .paused(cli.paused)
        .run()
        .context("running swarm")?;
    Ok(())
}
