//! `ambres` CLI: batch evaluation of the ambiguity resolvers over simulated
//! events, event-log import/export.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use resolver_core::{GreedyResolver, ResolutionMetrics, ScoreResolver};
use sim::event::{load_events, save_events, Event, EventLog};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ambres", about = "Track ambiguity resolution CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ResolverKind {
    /// Iterative worst-track eviction
    Greedy,
    /// Per-subdetector scoring with shared-hit pruning
    Score,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate events for a named scenario, resolve them and report metrics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of events to generate
        #[arg(long, default_value_t = 10)]
        events: usize,
        #[arg(long, value_enum, default_value = "greedy")]
        resolver: ResolverKind,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the generated events
        #[arg(long)]
        save_events: Option<PathBuf>,
    },
    /// Load a previously saved event log and resolve it.
    Replay {
        /// Path to event-log JSON file
        input: PathBuf,
        /// Scenario whose resolver settings to apply
        #[arg(long, value_enum, default_value = "duplicates")]
        scenario: ScenarioKind,
        #[arg(long, value_enum, default_value = "greedy")]
        resolver: ResolverKind,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            events,
            resolver,
            output,
            save_events: save_path,
        } => {
            run_scenario(
                scenario,
                seed,
                events,
                resolver,
                output.as_deref(),
                save_path.as_deref(),
            )?;
        }
        Commands::Replay {
            input,
            scenario,
            resolver,
            output,
        } => {
            run_replay(&input, scenario, resolver, output.as_deref())?;
        }
    }

    Ok(())
}

/// Resolve every event with a freshly built state; events are independent, so
/// they fan out across the rayon pool.
fn resolve_events(
    events: &[Event],
    scenario: &Scenario,
    resolver: &ResolverKind,
) -> Result<ResolutionMetrics> {
    let per_event: Vec<(Vec<usize>, bool)> = match resolver {
        ResolverKind::Greedy => {
            let greedy = GreedyResolver::new(scenario.greedy_config());
            events
                .par_iter()
                .map(|event| {
                    let res = greedy.resolve(&event.tracks, &event.measurements)?;
                    Ok((res.selected, res.converged))
                })
                .collect::<Result<_>>()?
        }
        ResolverKind::Score => {
            let score = ScoreResolver::new(scenario.score_config());
            events
                .par_iter()
                .map(|event| {
                    let res = score.solve(&event.tracks, &event.measurements)?;
                    Ok((res.accepted.iter().map(|a| a.track).collect(), true))
                })
                .collect::<Result<_>>()?
        }
    };

    let mut metrics = ResolutionMetrics::default();
    for (event, (accepted, converged)) in events.iter().zip(&per_event) {
        metrics.accumulate(&event.truth, accepted);
        if !converged {
            metrics.n_unconverged += 1;
        }
    }
    Ok(metrics)
}

fn print_summary(metrics: &ResolutionMetrics, elapsed: std::time::Duration) {
    println!(
        "Done: {} events, {} candidates in, {} accepted, elapsed={:.2}s",
        metrics.n_events,
        metrics.n_candidates,
        metrics.n_accepted,
        elapsed.as_secs_f64(),
    );
    println!(
        "Quality: efficiency={:.3}, duplicate_rate={:.3}, fake_rate={:.3}, unconverged={}",
        metrics.efficiency(),
        metrics.duplicate_rate(),
        metrics.fake_rate(),
        metrics.n_unconverged,
    );
}

fn write_metrics(metrics: &ResolutionMetrics, path: &std::path::Path) -> Result<()> {
    let json = serde_json::json!({
        "metrics": metrics,
        "efficiency": metrics.efficiency(),
        "duplicate_rate": metrics.duplicate_rate(),
        "fake_rate": metrics.fake_rate(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    println!("Metrics saved to {}", path.display());
    Ok(())
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    n_events: usize,
    resolver: ResolverKind,
    output_path: Option<&std::path::Path>,
    events_path: Option<&std::path::Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    println!(
        "Running scenario '{}' (seed={}, events={}, resolver={:?})...",
        scenario.name, seed, n_events, resolver
    );

    let start = std::time::Instant::now();
    let events: Vec<Event> = (0..n_events)
        .map(|i| scenario.generator(seed.wrapping_add(i as u64)).generate())
        .collect();
    let metrics = resolve_events(&events, &scenario, &resolver)?;
    print_summary(&metrics, start.elapsed());

    if let Some(path) = events_path {
        let log = EventLog {
            scenario_name: scenario.name.clone(),
            seed,
            events,
        };
        save_events(&log, path)?;
        println!("Events saved to {}", path.display());
    }

    if let Some(path) = output_path {
        write_metrics(&metrics, path)?;
    }

    Ok(())
}

fn run_replay(
    input: &std::path::Path,
    kind: ScenarioKind,
    resolver: ResolverKind,
    output_path: Option<&std::path::Path>,
) -> Result<()> {
    let log = load_events(input)?;
    println!(
        "Replaying '{}' ({} events, resolver={:?})...",
        log.scenario_name,
        log.events.len(),
        resolver
    );

    let scenario = Scenario::build(kind, log.seed);
    let start = std::time::Instant::now();
    let metrics = resolve_events(&log.events, &scenario, &resolver)?;
    print_summary(&metrics, start.elapsed());

    if let Some(path) = output_path {
        write_metrics(&metrics, path)?;
    }

    Ok(())
}
