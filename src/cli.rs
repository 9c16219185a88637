use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use datasight::config::AnalysisConfig;
use datasight::dataset::loader::load_dataset;
use datasight::pipeline::{AnalysisState, Pipeline};
use datasight::{export, report, synthesis};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "datasight", about = "Staged profiling, insight and anomaly analysis")]
pub struct Cli {
    /// Directory for rolling log files. Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log to the console only.
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a CSV, JSON or NDJSON file
    Analyze {
        /// Path to the data file
        file: PathBuf,

        /// Path to a JSON analysis configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip the visualization stage
        #[arg(long)]
        no_visualizations: bool,

        /// Minimum row count for the visualization stage to run
        #[arg(long)]
        min_rows_for_visualization: Option<usize>,

        /// Write the results as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write a Markdown report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Analyse a file and answer a question about it
    Ask {
        /// Path to the data file
        file: PathBuf,

        /// The question, e.g. "what is the maximum price?"
        question: String,

        /// Path to a JSON analysis configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Analyze {
            file,
            config,
            no_visualizations,
            min_rows_for_visualization,
            json,
            report,
        } => {
            let mut config = load_config(config.as_deref())?;
            if no_visualizations {
                config.enable_visualizations = false;
            }
            if let Some(min_rows) = min_rows_for_visualization {
                config.min_rows_for_visualization = min_rows;
            }
            config.validate()?;
            handle_analyze(&file, config, json.as_deref(), report.as_deref())
        }
        Commands::Ask {
            file,
            question,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            handle_ask(&file, config, &question)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run_pipeline(file: &Path, config: AnalysisConfig) -> Result<AnalysisState> {
    let dataset =
        load_dataset(file).with_context(|| format!("Failed to load {}", file.display()))?;
    Ok(Pipeline::new(config).run(dataset))
}

fn handle_analyze(
    file: &Path,
    config: AnalysisConfig,
    json: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let state = run_pipeline(file, config)?;

    println!("{}", report::profile_summary(&state));
    println!("{}", report::insights_summary(&state));
    println!("{}", report::anomalies_summary(&state));
    println!("{}", report::visualizations_summary(&state));
    if let Some(summary) = state.summary_result() {
        println!("{}\n", summary.text);
    }
    println!("{}", report::workflow_summary(&state));

    if let Some(path) = json {
        export::write_json(&state, path)?;
        println!("Results written to {}", path.display());
    }

    if let Some(path) = report_path {
        let title = file
            .file_name()
            .map(|n| format!("Analysis of {}", n.to_string_lossy()))
            .unwrap_or_else(|| "Analysis report".to_owned());
        std::fs::write(path, report::render_markdown(&state, &title))
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn handle_ask(file: &Path, config: AnalysisConfig, question: &str) -> Result<()> {
    let state = run_pipeline(file, config)?;
    println!("{}", synthesis::answer_question(&state, question));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "datasight",
            "analyze",
            "data.csv",
            "--no-visualizations",
            "--min-rows-for-visualization",
            "25",
            "--json",
            "out.json",
        ])?;
        match cli.command {
            Commands::Analyze {
                file,
                no_visualizations,
                min_rows_for_visualization,
                json,
                ..
            } => {
                assert_eq!(file, PathBuf::from("data.csv"));
                assert!(no_visualizations);
                assert_eq!(min_rows_for_visualization, Some(25));
                assert_eq!(json, Some(PathBuf::from("out.json")));
            }
            Commands::Ask { .. } => panic!("expected analyze"),
        }
        Ok(())
    }

    #[test]
    fn test_analyze_writes_outputs() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let csv = dir.path().join("data.csv");
        std::fs::write(&csv, "a,b\n1,10\n2,20\n3,30\n4,40\n100,50\n")?;
        let json = dir.path().join("out.json");
        let md = dir.path().join("out.md");

        handle_analyze(&csv, AnalysisConfig::default(), Some(&json), Some(&md))?;

        assert!(std::fs::read_to_string(&json)?.contains("\"workflow_state\": \"done\""));
        assert!(std::fs::read_to_string(&md)?.starts_with("# Analysis of data.csv"));
        Ok(())
    }
}
