use plife::{ScenarioConfig, Scenario};
use plife::run_headless;
use plife::{bench_accumulators, bench_tick_curve};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Particle Life simulation kernel")]
struct Args {
    /// Scenario file; bare names are looked up in `scenarios/`
    #[arg(short, long = "file", default_value = "default.yaml")]
    file_name: String,

    /// Ticks to run, overriding `engine.ticks`
    #[arg(long)]
    ticks: Option<u64>,

    /// Time the force accumulators and exit
    #[arg(long)]
    bench: bool,

    /// Print the tick cost curve as CSV and exit
    #[arg(long)]
    bench_curve: bool,
}

fn resolve_path(file_name: &str) -> PathBuf {
    let direct = PathBuf::from(file_name);
    if direct.exists() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = resolve_path(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.bench {
        bench_accumulators();
        return Ok(());
    }
    if args.bench_curve {
        bench_tick_curve();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(scenario_cfg).context("invalid scenario")?;
    info!("parameters:\n{}", scenario.dump_parameters());

    let ticks = args.ticks.unwrap_or(scenario.engine.ticks);
    let report = run_headless(&mut scenario, ticks).context("simulation stopped")?;

    println!("{}", scenario.statistics());
    println!("visible: {} / {}", report.visible, scenario.particles().len());

    Ok(())
}
