//! mddrt
//!
//! Discovery of multi-dimensional directly-rooted trees (MDDRT) from
//! process event logs.
//!
//! Every case of the log is walked from a synthetic root, one node per
//! `(activity, depth)` prefix state. Each node aggregates the cases passing
//! through it along four independent dimensions: cost, time, rework and
//! optionality. Non-branching chains can be collapsed into grouped nodes.
//!
//! ## Getting Started
//!
//! ```ignore
//! use mddrt::eventlog::load_log;
//! use mddrt::tree::discover_multi_dimensional_drt;
//! use mddrt::utils::DrtParameters;
//!
//! let params = DrtParameters::new().with_grouping(true);
//! let log = load_log("log.json", &params)?;
//! let tree = discover_multi_dimensional_drt(&log, &params)?;
//! ```
//!
//! The `mddrt` CLI wraps the same pipeline:
//!
//! ```bash
//! mddrt discover --log log.json --group
//! ```

pub mod commands;
pub mod eventlog;
pub mod metrics;
pub mod output;
pub mod tree;
pub mod utils;
