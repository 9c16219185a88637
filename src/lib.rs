//! # Datasight - staged analysis of tabular datasets
//!
//! Datasight runs a fixed sequence of analysis stages over an in-memory
//! [`dataset::Dataset`] and collects everything into one
//! [`pipeline::AnalysisState`]:
//!
//! 1. **Profiling**: per-column statistics, quality issues, quality score
//! 2. **Insights**: correlations, skew, category imbalance, missing data, duplicates
//! 3. **Anomalies**: z-score and IQR outliers, sparse categories, temporal irregularities
//! 4. **Visualization** (optional): chart specs from a [`visualization::Visualizer`]
//! 5. **Synthesis**: a narrative or fallback summary
//!
//! ## Quick Start
//!
//! ```no_run
//! use datasight::config::AnalysisConfig;
//! use datasight::dataset::loader::load_dataset;
//! use datasight::pipeline::Pipeline;
//!
//! let dataset = load_dataset("sales.csv".as_ref())?;
//! let state = Pipeline::new(AnalysisConfig::default()).run(dataset);
//!
//! for insight in state.insight_result().unwrap_or_default() {
//!     println!("{} ({:.0}%)", insight.title, insight.confidence * 100.0);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`dataset`]: typed columns, kind inference and file loading
//! - [`analyser`]: the profiling, insight and anomaly computations
//! - [`pipeline`]: stage executors and the orchestrator
//! - [`visualization`] and [`synthesis`]: pluggable collaborators
//! - [`report`] and [`export`]: text, Markdown and JSON output
//! - [`config`], [`error`], [`logging`]: ambient plumbing
//!
//! A stage that fails never aborts a run. Its fault is recorded on the
//! state, its result slot receives an empty value, and the run finishes as
//! [`pipeline::ExecutionStatus::CompletedWithErrors`].

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod synthesis;
pub mod visualization;
