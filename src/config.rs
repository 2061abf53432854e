use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;

use crate::instance::GeneratorParams;

#[derive(Parser, Debug)]
#[command(
    name = "hole-motion",
    about = "Move a robot to its goal on a graph by sliding obstacles into holes.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the JSON instance to solve")]
    pub instance_path: Option<String>,

    #[arg(long, help = "Generate this many random instances instead of solving")]
    pub generate: Option<usize>,

    #[arg(long, help = "Directory for generated instances")]
    pub instance_dir: Option<String>,

    #[arg(long, help = "Directory for solution files")]
    pub output_dir: Option<String>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Stop solving after this many rounds, 0 for no limit")]
    pub max_iterations: Option<usize>,

    #[arg(long, help = "Generator: number of chains")]
    pub chain_count: Option<usize>,

    #[arg(long, help = "Generator: shortest chain")]
    pub min_chain_length: Option<usize>,

    #[arg(long, help = "Generator: longest chain before concatenation")]
    pub max_chain_length: Option<usize>,

    #[arg(long, help = "Generator: number of cycles")]
    pub cycle_count: Option<usize>,

    #[arg(long, help = "Generator: share of vertices holding obstacles")]
    pub obstacle_ratio: Option<f64>,

    #[arg(long, help = "Log filter, e.g. info or hole_motion=debug")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub instance_path: Option<String>,
    pub generate: Option<usize>,
    pub instance_dir: String,
    pub output_dir: String,
    pub seed: u64,
    pub max_iterations: usize,
    pub generator: GeneratorParams,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instance_path: None,
            generate: None,
            instance_dir: "instances".to_string(),
            output_dir: "solutions".to_string(),
            seed: 0,
            max_iterations: 0,
            generator: GeneratorParams::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(instance_path) = &cli.instance_path {
            self.instance_path = Some(instance_path.clone());
        }
        if let Some(generate) = cli.generate {
            self.generate = Some(generate);
        }
        if let Some(instance_dir) = &cli.instance_dir {
            self.instance_dir = instance_dir.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(max_iterations) = cli.max_iterations {
            self.max_iterations = max_iterations;
        }
        if let Some(chain_count) = cli.chain_count {
            self.generator.chain_count = chain_count;
        }
        if let Some(min_chain_length) = cli.min_chain_length {
            self.generator.min_chain_length = min_chain_length;
        }
        if let Some(max_chain_length) = cli.max_chain_length {
            self.generator.max_chain_length = max_chain_length;
        }
        if let Some(cycle_count) = cli.cycle_count {
            self.generator.cycle_count = cycle_count;
        }
        if let Some(obstacle_ratio) = cli.obstacle_ratio {
            self.generator.obstacle_ratio = obstacle_ratio;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.instance_path.is_none() && self.generate.is_none() {
            return Err(anyhow!(
                "Nothing to do: pass --instance-path to solve or --generate to create instances"
            ));
        }

        let generator = &self.generator;
        if generator.min_chain_length > generator.max_chain_length {
            return Err(anyhow!(
                "Chain length bounds are reversed: min {} > max {}",
                generator.min_chain_length,
                generator.max_chain_length
            ));
        }
        if !(0.0..=1.0).contains(&generator.obstacle_ratio) {
            return Err(anyhow!(
                "Obstacle ratio must be within [0, 1], got {}",
                generator.obstacle_ratio
            ));
        }
        Ok(())
    }
}
