use anyhow::{Context, Result};
use clap::Parser;
use diagnosis_core::chart::render_chart;
use diagnosis_core::cli::{Cli, Commands};
use diagnosis_core::config::Config;
use diagnosis_core::core::types::Observation;
use diagnosis_core::persistence::{CsvCaseLog, FileStore};
use diagnosis_core::prompt::ConsoleInput;
use diagnosis_core::session::Session;
use diagnosis_core::DiagnosisEngine;
use serde_json::json;
use std::io::{stdin, stdout, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::from(&cli);
    info!("diagnose v{} starting", env!("CARGO_PKG_VERSION"));

    let store = FileStore::new(config.table_path(), config.stats_path());
    let mut engine = DiagnosisEngine::load(store)
        .with_context(|| format!("could not load data from {}", config.data_dir.display()))?;

    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Run => run_interactive(&mut engine, &config),
        Commands::Score { present, json } => score_once(&engine, &config, &present, json),
        Commands::Stats { json } => print_stats(&engine, json),
        Commands::Reset => {
            engine.reset().context("could not reset statistics")?;
            println!(
                "Reset {} categories to a uniform prior.",
                engine.table.categories.len()
            );
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_interactive(engine: &mut DiagnosisEngine<FileStore>, config: &Config) -> Result<()> {
    println!("Symptom checker. Answer each question with Y or N.");
    println!("---------------------------------------------------------------");

    let mut input = ConsoleInput::new(stdin().lock(), stdout());
    let mut out = stdout();
    let mut case_log = CsvCaseLog::new(config.case_log_path(), &engine.table);

    let mut session = Session::new(engine, &mut input, &mut out);
    if config.chart {
        session = session.with_chart(config.chart_style());
    }
    if config.log_cases {
        session = session.with_case_log(&mut case_log);
    }
    let outcome = session.run().context("session aborted")?;

    if outcome.logged {
        println!("Case appended to '{}'", config.case_log_path().display());
    }
    Ok(())
}

fn score_once(
    engine: &DiagnosisEngine<FileStore>,
    config: &Config,
    present: &[String],
    json: bool,
) -> Result<()> {
    let observation = Observation::from_present(engine.symptoms(), present)?;
    let diagnosis = engine.diagnose(&observation)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
        return Ok(());
    }
    for category in &engine.table.categories {
        println!("{category}: {:.2}%", diagnosis.posterior[category] * 100.0);
    }
    println!("Most likely diagnosis: {}", diagnosis.predicted);
    if config.chart {
        let mut out = stdout();
        writeln!(out)?;
        render_chart(&mut out, &diagnosis.posterior, &diagnosis.predicted, config.chart_style())?;
    }
    Ok(())
}

fn print_stats(engine: &DiagnosisEngine<FileStore>, json: bool) -> Result<()> {
    let priors = engine.priors()?;
    if json {
        let value = json!({
            "counters": engine.counters,
            "priors": priors,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!("{:<20} {:>8} {:>8}", "disease", "count", "prior");
    for category in &engine.table.categories {
        println!(
            "{:<20} {:>8} {:>8.4}",
            category, engine.counters[category], priors[category]
        );
    }
    Ok(())
}
