use hole_motion::config::{Cli, Config};
use hole_motion::instance::Instance;
use hole_motion::solver::{MotionPlanner, Solver};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();
    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    if let Some(count) = config.generate {
        generate_instances(&config, count)?;
    }
    if let Some(instance_path) = config.instance_path.as_ref() {
        solve_instance(&config, Path::new(instance_path))?;
    }

    Ok(())
}

fn generate_instances(config: &Config, count: usize) -> anyhow::Result<()> {
    let dir = Path::new(&config.instance_dir);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create instance dir {}", dir.display()))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    for i in 0..count {
        let params = config.generator.for_batch_index(i);
        let instance = Instance::generate(&params, &mut rng)?;
        let path = instance.export(dir)?;
        info!("Generated problem {i}, saved as {}", path.display());
    }
    Ok(())
}

fn solve_instance(config: &Config, instance_path: &Path) -> anyhow::Result<()> {
    let instance = Instance::load_from_file(instance_path)
        .with_context(|| format!("error loading instance {}", instance_path.display()))?;

    let start_time = Instant::now();
    let mut planner = MotionPlanner::from_seed(&instance, config.seed);
    let solution = planner.solve(config)?;
    let elapsed_time = start_time.elapsed().as_secs_f64();
    info!("Finished in {elapsed_time}");

    if !solution.verify(&instance) {
        error!("solution for {} failed verification", instance.name);
    }
    if solution.is_solved() {
        info!("Solved with cost {}!", solution.cost);
    } else {
        info!("Unsolvable instance: {:?}", solution.status);
    }

    let dir = Path::new(&config.output_dir);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create output dir {}", dir.display()))?;
    let path = solution.write_to_dir(dir, &instance.name, elapsed_time)?;
    info!("Saved result to {}", path.display());
    Ok(())
}
