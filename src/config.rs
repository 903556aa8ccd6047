// File: src/config.rs
use crate::chart::ChartStyle;
use crate::cli::Cli;
use std::path::{Path, PathBuf};

/// Where the files live and how the session presents itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub table_file: PathBuf,
    pub stats_file: PathBuf,
    pub case_log_file: PathBuf,
    pub log_cases: bool,
    pub chart: bool,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            table_file: PathBuf::from("diseases.csv"),
            stats_file: PathBuf::from("stats.csv"),
            case_log_file: PathBuf::from("case_log.csv"),
            log_cases: false,
            chart: true,
            color: true,
        }
    }
}

impl Config {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn table_path(&self) -> PathBuf {
        self.resolve(&self.table_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.resolve(&self.stats_file)
    }

    pub fn case_log_path(&self) -> PathBuf {
        self.resolve(&self.case_log_file)
    }

    pub fn chart_style(&self) -> ChartStyle {
        ChartStyle {
            color: self.color,
            ..ChartStyle::default()
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            table_file: cli.table.clone(),
            stats_file: cli.stats.clone(),
            case_log_file: cli.case_log.clone(),
            log_cases: cli.log_cases,
            chart: !cli.no_chart,
            color: !cli.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn relative_files_resolve_under_data_dir() {
        let config = Config::with_data_dir("/var/lib/triage");
        assert_eq!(config.table_path(), PathBuf::from("/var/lib/triage/diseases.csv"));
        assert_eq!(config.stats_path(), PathBuf::from("/var/lib/triage/stats.csv"));
    }

    #[test]
    fn absolute_files_are_kept() {
        let config = Config {
            case_log_file: PathBuf::from("/tmp/cases.csv"),
            ..Config::with_data_dir("data")
        };
        assert_eq!(config.case_log_path(), PathBuf::from("/tmp/cases.csv"));
    }

    #[test]
    fn cli_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "diagnose", "--data-dir", "d", "--log-cases", "--no-chart", "--no-color",
        ])
        .unwrap();
        let config = Config::from(&cli);
        assert_eq!(config.data_dir, PathBuf::from("d"));
        assert!(config.log_cases);
        assert!(!config.chart);
        assert!(!config.color);
    }
}
