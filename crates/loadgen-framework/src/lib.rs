//! Bulk-write orchestration for loadgen.
//!
//! A run is a sequence of rounds. Each round fans out twice:
//! 1. one backend task per backend in the [`RoundPlan`]
//! 2. `workers_per_backend` worker tasks per backend, each owning one connection and writing
//!    `rows_per_worker` rows through the [`BatchWriter`]
//!
//! Both levels are joined with a [`TaskGroup`]. The first failure cancels every sibling and is
//! returned to the caller; a round only reports its total when every worker succeeded.
//!
//! # Example
//!
//! ```ignore
//! use loadgen_framework::{LoadOrchestrator, RoundPlan, RoundSchedule};
//!
//! let plan = RoundPlan::new(vec!["postgresql".into(), "mysql".into()], 10, 1000)?;
//! let orchestrator = LoadOrchestrator::new(provider, dialects);
//! let report = orchestrator.run(&RoundSchedule::single(plan)).await?;
//! println!("{} rows", report.total_rows());
//! ```

pub mod orchestrator;
pub mod plan;
pub mod preset;
pub mod report;
pub mod task_group;
pub mod worker;
pub mod writer;

pub use orchestrator::LoadOrchestrator;
pub use plan::{RoundPlan, RoundSchedule, ScalingRule};
pub use preset::{PlanOverrides, Shape};
pub use report::{BackendReport, RoundReport, RunReport, WorkerReport};
pub use task_group::TaskGroup;
pub use worker::WorkerTask;
pub use writer::{row_values, BatchError, BatchWriter};
