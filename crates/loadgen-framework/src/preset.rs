//! Preset load shapes.
//!
//! Every shape is a parameterization of the same orchestrator; they differ only in the
//! starting plan, the number of rounds, and the scaling rule.

use crate::plan::{RoundPlan, RoundSchedule, ScalingRule};
use loadgen_core::{BackendId, LoadError};

pub const BULK_ROWS_PER_WORKER: u64 = 1_000_000;
pub const BURST_WORKERS_PER_BACKEND: usize = 10;
pub const BURST_ROWS_PER_WORKER: u64 = 1_000;
pub const ESCALATING_ROUNDS: u32 = 20;
pub const ESCALATING_ROWS_INCREMENT: u64 = 1_000;
pub const ESCALATING_WORKERS_INCREMENT: usize = 10;

/// Load shape selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// First backend only, one worker, one very large batch.
    Bulk,
    /// Every backend, fixed workers x rows, one round.
    Burst,
    /// Every backend, growing workers x rows over a bounded number of rounds.
    Escalating,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Bulk => write!(f, "bulk"),
            Shape::Burst => write!(f, "burst"),
            Shape::Escalating => write!(f, "escalating"),
        }
    }
}

impl std::str::FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bulk" => Ok(Shape::Bulk),
            "burst" => Ok(Shape::Burst),
            "escalating" | "ramp" => Ok(Shape::Escalating),
            _ => Err(format!("Unknown shape: {s}")),
        }
    }
}

/// Values that replace a shape's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    pub workers_per_backend: Option<usize>,
    pub rows_per_worker: Option<u64>,
    pub rounds: Option<u32>,
    pub rows_increment: Option<u64>,
    pub workers_increment: Option<usize>,
}

impl Shape {
    /// Build the schedule for this shape over `backends`.
    pub fn schedule(
        &self,
        backends: Vec<BackendId>,
        overrides: &PlanOverrides,
    ) -> Result<RoundSchedule, LoadError> {
        match self {
            Shape::Bulk => {
                let first = backends.into_iter().next().ok_or_else(|| {
                    LoadError::InvalidPlan("no backends selected".to_string())
                })?;
                let plan = RoundPlan::new(
                    vec![first],
                    overrides.workers_per_backend.unwrap_or(1),
                    overrides.rows_per_worker.unwrap_or(BULK_ROWS_PER_WORKER),
                )?;
                Ok(RoundSchedule::single(plan))
            }
            Shape::Burst => {
                let plan = self.starting_plan(backends, overrides)?;
                Ok(RoundSchedule::single(plan))
            }
            Shape::Escalating => {
                let plan = self.starting_plan(backends, overrides)?;
                let scaling = ScalingRule::new(
                    overrides.rows_increment.unwrap_or(ESCALATING_ROWS_INCREMENT),
                    overrides
                        .workers_increment
                        .unwrap_or(ESCALATING_WORKERS_INCREMENT),
                );
                RoundSchedule::escalating(
                    plan,
                    overrides.rounds.unwrap_or(ESCALATING_ROUNDS),
                    scaling,
                )
            }
        }
    }

    fn starting_plan(
        &self,
        backends: Vec<BackendId>,
        overrides: &PlanOverrides,
    ) -> Result<RoundPlan, LoadError> {
        RoundPlan::new(
            backends,
            overrides
                .workers_per_backend
                .unwrap_or(BURST_WORKERS_PER_BACKEND),
            overrides.rows_per_worker.unwrap_or(BURST_ROWS_PER_WORKER),
        )
    }
}
