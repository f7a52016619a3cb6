//! Round plans and the rule that scales them between rounds.

use loadgen_core::{BackendId, LoadError};

/// Work for one round: every backend gets `workers_per_backend` workers, and every worker
/// writes `rows_per_worker` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    pub backends: Vec<BackendId>,
    pub workers_per_backend: usize,
    pub rows_per_worker: u64,
}

impl RoundPlan {
    /// Validate and build a plan.
    ///
    /// At least one backend and one worker per backend are required, and a backend may appear
    /// only once. `rows_per_worker` may be zero: workers then only open and close a connection.
    /// The round's worker and row totals must fit their integer types.
    pub fn new(
        backends: Vec<BackendId>,
        workers_per_backend: usize,
        rows_per_worker: u64,
    ) -> Result<Self, LoadError> {
        if backends.is_empty() {
            return Err(LoadError::InvalidPlan("no backends selected".to_string()));
        }
        if workers_per_backend == 0 {
            return Err(LoadError::InvalidPlan(
                "workers per backend must be at least 1".to_string(),
            ));
        }
        for (i, backend) in backends.iter().enumerate() {
            if backends[..i].contains(backend) {
                return Err(LoadError::InvalidPlan(format!(
                    "backend '{backend}' listed more than once"
                )));
            }
        }

        let plan = Self {
            backends,
            workers_per_backend,
            rows_per_worker,
        };
        if plan.checked_total_rows().is_none() || plan.checked_total_workers().is_none() {
            return Err(LoadError::InvalidPlan(format!(
                "{} backends x {} workers x {} rows overflows",
                plan.backends.len(),
                workers_per_backend,
                rows_per_worker
            )));
        }
        Ok(plan)
    }

    fn checked_rows_per_backend(&self) -> Option<u64> {
        u64::try_from(self.workers_per_backend)
            .ok()?
            .checked_mul(self.rows_per_worker)
    }

    fn checked_total_rows(&self) -> Option<u64> {
        self.checked_rows_per_backend()?
            .checked_mul(u64::try_from(self.backends.len()).ok()?)
    }

    fn checked_total_workers(&self) -> Option<usize> {
        self.workers_per_backend.checked_mul(self.backends.len())
    }

    /// Saturates for plans not built through [`RoundPlan::new`].
    pub fn rows_per_backend(&self) -> u64 {
        self.checked_rows_per_backend().unwrap_or(u64::MAX)
    }

    /// Rows written by the round when no write fails.
    pub fn total_rows(&self) -> u64 {
        self.checked_total_rows().unwrap_or(u64::MAX)
    }

    pub fn total_workers(&self) -> usize {
        self.checked_total_workers().unwrap_or(usize::MAX)
    }
}

/// Fixed growth applied to a plan between consecutive rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScalingRule {
    pub rows_increment: u64,
    pub workers_increment: usize,
}

impl ScalingRule {
    pub fn new(rows_increment: u64, workers_increment: usize) -> Self {
        Self {
            rows_increment,
            workers_increment,
        }
    }

    /// The plan that follows `plan`.
    pub fn next(&self, plan: &RoundPlan) -> Result<RoundPlan, LoadError> {
        let workers = plan
            .workers_per_backend
            .checked_add(self.workers_increment)
            .ok_or_else(|| LoadError::InvalidPlan("workers per backend overflows".to_string()))?;
        let rows = plan
            .rows_per_worker
            .checked_add(self.rows_increment)
            .ok_or_else(|| LoadError::InvalidPlan("rows per worker overflows".to_string()))?;
        RoundPlan::new(plan.backends.clone(), workers, rows)
    }
}

/// A bounded sequence of rounds derived from a starting plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSchedule {
    pub initial: RoundPlan,
    pub rounds: u32,
    pub scaling: ScalingRule,
}

impl RoundSchedule {
    /// One round, no scaling.
    pub fn single(plan: RoundPlan) -> Self {
        Self {
            initial: plan,
            rounds: 1,
            scaling: ScalingRule::default(),
        }
    }

    /// `rounds` rounds, each grown from the previous one by `scaling`.
    ///
    /// Every round's plan and the row total across all rounds must fit their integer types.
    pub fn escalating(
        initial: RoundPlan,
        rounds: u32,
        scaling: ScalingRule,
    ) -> Result<Self, LoadError> {
        if rounds == 0 {
            return Err(LoadError::InvalidPlan(
                "round count must be at least 1".to_string(),
            ));
        }
        let mut plan = initial.clone();
        let mut total = plan.total_rows();
        for _ in 1..rounds {
            plan = scaling.next(&plan)?;
            total = total.checked_add(plan.total_rows()).ok_or_else(|| {
                LoadError::InvalidPlan(format!("total rows over {rounds} rounds overflows"))
            })?;
        }
        Ok(Self {
            initial,
            rounds,
            scaling,
        })
    }

    /// Plan of round `round` (1-based), or `None` past the bound or when it overflows.
    pub fn plan_for(&self, round: u32) -> Option<RoundPlan> {
        if round == 0 || round > self.rounds {
            return None;
        }
        let steps = round - 1;
        let workers = self
            .scaling
            .workers_increment
            .checked_mul(usize::try_from(steps).ok()?)?
            .checked_add(self.initial.workers_per_backend)?;
        let rows = self
            .scaling
            .rows_increment
            .checked_mul(u64::from(steps))?
            .checked_add(self.initial.rows_per_worker)?;
        Some(RoundPlan {
            backends: self.initial.backends.clone(),
            workers_per_backend: workers,
            rows_per_worker: rows,
        })
    }

    /// `(round, plan)` pairs for every round, starting at 1.
    ///
    /// Stops early if a round cannot be represented, which [`RoundSchedule::escalating`] rules
    /// out.
    pub fn iter(&self) -> impl Iterator<Item = (u32, RoundPlan)> + '_ {
        (1..=self.rounds).map_while(move |round| self.plan_for(round).map(|plan| (round, plan)))
    }

    /// Rows written across every round when no write fails.
    pub fn total_rows(&self) -> u64 {
        self.iter()
            .fold(0u64, |total, (_, plan)| total.saturating_add(plan.total_rows()))
    }
}
