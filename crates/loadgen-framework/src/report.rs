//! Aggregate counts produced by a run.

use loadgen_core::BackendId;
use std::time::Duration;

/// Rows written by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub backend: BackendId,
    pub worker: usize,
    pub rows: u64,
}

/// Rows written by all workers of one backend in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReport {
    pub backend: BackendId,
    pub workers: usize,
    pub rows: u64,
}

impl BackendReport {
    pub fn from_workers(backend: BackendId, workers: &[WorkerReport]) -> Self {
        Self {
            backend,
            workers: workers.len(),
            rows: workers.iter().map(|w| w.rows).sum(),
        }
    }
}

/// Outcome of a fully successful round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// 1-based round number.
    pub round: u32,
    /// One entry per backend, in plan order.
    pub backends: Vec<BackendReport>,
    pub total_rows: u64,
    pub elapsed: Duration,
}

impl RoundReport {
    pub fn rows_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_rows as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// All rounds of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rounds: Vec<RoundReport>,
}

impl RunReport {
    pub fn total_rows(&self) -> u64 {
        self.rounds.iter().map(|r| r.total_rows).sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.rounds.iter().map(|r| r.elapsed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_report_sums_workers() {
        let backend = BackendId::new("postgresql");
        let workers: Vec<WorkerReport> = (0..3)
            .map(|worker| WorkerReport {
                backend: backend.clone(),
                worker,
                rows: 4,
            })
            .collect();

        let report = BackendReport::from_workers(backend, &workers);
        assert_eq!(report.workers, 3);
        assert_eq!(report.rows, 12);
    }

    #[test]
    fn test_rows_per_second() {
        let round = RoundReport {
            round: 1,
            backends: Vec::new(),
            total_rows: 1000,
            elapsed: Duration::from_secs(10),
        };
        assert_eq!(round.rows_per_second(), 100.0);

        let run = RunReport {
            rounds: vec![round.clone(), round],
        };
        assert_eq!(run.total_rows(), 2000);
        assert_eq!(run.elapsed(), Duration::from_secs(20));
    }
}
