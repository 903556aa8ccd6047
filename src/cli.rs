//! Command-line argument parsing.
//!
//! Keeps argument parsing separate from execution logic.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Naive Bayes symptom checker with adaptive priors
#[derive(Parser, Debug)]
#[command(name = "diagnose")]
#[command(about = "Naive Bayes symptom checker with adaptive priors", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding the table, counters and case log
    #[arg(long, global = true, env = "SYMPTOM_BAYES_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Likelihood table file name, relative to the data directory
    #[arg(long, global = true, default_value = "diseases.csv")]
    pub table: PathBuf,

    /// Counter file name, relative to the data directory
    #[arg(long, global = true, default_value = "stats.csv")]
    pub stats: PathBuf,

    /// Case log file name, relative to the data directory
    #[arg(long, global = true, default_value = "case_log.csv")]
    pub case_log: PathBuf,

    /// Append every finished session to the case log
    #[arg(long, global = true)]
    pub log_cases: bool,

    /// Skip the bar chart
    #[arg(long, global = true)]
    pub no_chart: bool,

    /// Disable terminal colors
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand (if not provided, runs an interactive session)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive session: answer symptom questions, confirm the diagnosis
    Run,

    /// Score a symptom set without prompting or saving anything
    Score {
        /// Symptoms that are present; every other symptom counts as absent
        #[arg(long = "present", value_name = "SYMPTOM")]
        present: Vec<String>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Show counters and the priors derived from them
    Stats {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Put every counter back to 1 and make the priors uniform
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_interactive() {
        let cli = Cli::try_parse_from(["diagnose"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.table, PathBuf::from("diseases.csv"));
        assert!(!cli.log_cases);
    }

    #[test]
    fn score_collects_present_symptoms() {
        let cli = Cli::try_parse_from([
            "diagnose", "score", "--present", "fever", "--present", "cough", "--json", "-vv",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Score {
                present: vec!["fever".into(), "cough".into()],
                json: true
            })
        );
        assert_eq!(cli.verbose, 2);
    }
}
