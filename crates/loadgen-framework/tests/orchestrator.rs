//! Orchestrator tests against an in-memory connection provider.

use async_trait::async_trait;
use loadgen_core::{BackendId, BoxError, Connection, ConnectionProvider, Dialect, LoadError};
use loadgen_framework::{LoadOrchestrator, RoundPlan, RoundSchedule, ScalingRule};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Statements one connection executed, captured when it is closed.
#[derive(Debug, Clone)]
struct ClosedConnection {
    backend: BackendId,
    /// Position among the connections opened for `backend`.
    nth: usize,
    statements: Vec<(String, Vec<String>)>,
}

#[derive(Default)]
struct Recorder {
    opened: AtomicUsize,
    closed: Mutex<Vec<ClosedConnection>>,
}

/// Makes the `nth` connection opened for `backend` fail on its `call`-th execute (0-based).
#[derive(Clone)]
struct WriteFailure {
    backend: BackendId,
    nth: usize,
    call: usize,
}

#[derive(Default)]
struct FakeProvider {
    recorder: Arc<Recorder>,
    per_backend: Mutex<HashMap<BackendId, usize>>,
    write_failure: Option<WriteFailure>,
    unreachable: Option<BackendId>,
}

struct FakeConnection {
    backend: BackendId,
    nth: usize,
    statements: Vec<(String, Vec<String>)>,
    fail_on_call: Option<usize>,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, BoxError> {
        if self.fail_on_call == Some(self.statements.len()) {
            return Err("simulated write failure".into());
        }
        self.statements.push((
            sql.to_string(),
            params.iter().map(|p| p.to_string()).collect(),
        ));
        tokio::task::yield_now().await;
        Ok(1)
    }

    async fn close(self: Box<Self>) {
        self.recorder.closed.lock().unwrap().push(ClosedConnection {
            backend: self.backend,
            nth: self.nth,
            statements: self.statements,
        });
    }
}

#[async_trait]
impl ConnectionProvider for FakeProvider {
    async fn acquire(&self, backend: &BackendId) -> Result<Box<dyn Connection>, LoadError> {
        if self.unreachable.as_ref() == Some(backend) {
            return Err(LoadError::connect(backend, "connection refused"));
        }

        let nth = {
            let mut counts = self.per_backend.lock().unwrap();
            let count = counts.entry(backend.clone()).or_insert(0);
            let nth = *count;
            *count += 1;
            nth
        };
        let fail_on_call = self
            .write_failure
            .as_ref()
            .filter(|f| &f.backend == backend && f.nth == nth)
            .map(|f| f.call);

        self.recorder.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            backend: backend.clone(),
            nth,
            statements: Vec::new(),
            fail_on_call,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

fn pg() -> BackendId {
    BackendId::new("postgresql")
}

fn mysql() -> BackendId {
    BackendId::new("mysql")
}

fn dialects() -> HashMap<BackendId, Dialect> {
    HashMap::from([(pg(), Dialect::Dollar), (mysql(), Dialect::QuestionMark)])
}

fn orchestrator(provider: FakeProvider) -> (LoadOrchestrator, Arc<Recorder>) {
    let recorder = Arc::clone(&provider.recorder);
    (
        LoadOrchestrator::new(Arc::new(provider), dialects()),
        recorder,
    )
}

fn expected_rows(count: u64) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| vec![format!("User_{i}"), format!("Address_{i}")])
        .collect()
}

#[tokio::test]
async fn test_two_backends_three_workers_four_rows() {
    let (orchestrator, recorder) = orchestrator(FakeProvider::default());
    let plan = RoundPlan::new(vec![pg(), mysql()], 3, 4).unwrap();

    let report = orchestrator
        .run(&RoundSchedule::single(plan))
        .await
        .unwrap();

    assert_eq!(report.total_rows(), 24);
    let round = &report.rounds[0];
    assert_eq!(round.total_rows, 24);
    assert_eq!(round.backends.len(), 2);
    assert_eq!(round.backends[0].backend, pg());
    assert_eq!(round.backends[1].backend, mysql());
    assert!(round.backends.iter().all(|b| b.rows == 12 && b.workers == 3));

    assert_eq!(recorder.opened.load(Ordering::SeqCst), 6);
    let closed = recorder.closed.lock().unwrap();
    assert_eq!(closed.len(), 6);
    for conn in closed.iter() {
        let params: Vec<Vec<String>> = conn.statements.iter().map(|(_, p)| p.clone()).collect();
        assert_eq!(params, expected_rows(4));

        let expected_sql = if conn.backend == pg() {
            "INSERT INTO mst_user (name, address) VALUES ($1, $2)"
        } else {
            "INSERT INTO mst_user (name, address) VALUES (?, ?)"
        };
        assert!(conn.statements.iter().all(|(sql, _)| sql == expected_sql));
    }
}

#[tokio::test]
async fn test_zero_rows_still_opens_and_closes() {
    let (orchestrator, recorder) = orchestrator(FakeProvider::default());
    let plan = RoundPlan::new(vec![pg()], 1, 0).unwrap();

    let report = orchestrator
        .run(&RoundSchedule::single(plan))
        .await
        .unwrap();

    assert_eq!(report.total_rows(), 0);
    assert_eq!(recorder.opened.load(Ordering::SeqCst), 1);
    let closed = recorder.closed.lock().unwrap();
    assert_eq!(closed.len(), 1);
    assert!(closed[0].statements.is_empty());
}

#[tokio::test]
async fn test_write_failure_is_fatal_for_the_round() {
    let provider = FakeProvider {
        write_failure: Some(WriteFailure {
            backend: mysql(),
            nth: 1,
            call: 1,
        }),
        ..Default::default()
    };
    let (orchestrator, recorder) = orchestrator(provider);
    let plan = RoundPlan::new(vec![pg(), mysql()], 3, 4).unwrap();

    let err = orchestrator
        .run(&RoundSchedule::single(plan))
        .await
        .unwrap_err();

    match err {
        LoadError::Write { backend, row, .. } => {
            assert_eq!(backend, mysql());
            assert_eq!(row, 1);
        }
        other => panic!("expected write failure, got {other:?}"),
    }

    // Every connection that was opened was also released, and the failing worker stopped
    // right after its first row.
    let closed = recorder.closed.lock().unwrap();
    assert_eq!(closed.len(), recorder.opened.load(Ordering::SeqCst));
    let failing = closed
        .iter()
        .find(|c| c.backend == mysql() && c.nth == 1)
        .expect("failing connection was closed");
    let failing_rows: Vec<Vec<String>> =
        failing.statements.iter().map(|(_, p)| p.clone()).collect();
    assert_eq!(failing_rows, expected_rows(1));
    for conn in closed.iter() {
        let params: Vec<Vec<String>> = conn.statements.iter().map(|(_, p)| p.clone()).collect();
        assert_eq!(params, expected_rows(params.len() as u64));
    }
}

#[tokio::test]
async fn test_connect_failure_is_fatal() {
    let provider = FakeProvider {
        unreachable: Some(pg()),
        ..Default::default()
    };
    let (orchestrator, recorder) = orchestrator(provider);
    let plan = RoundPlan::new(vec![pg(), mysql()], 2, 10).unwrap();

    let err = orchestrator
        .run(&RoundSchedule::single(plan))
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::Connect { ref backend, .. } if *backend == pg()));
    assert_eq!(
        recorder.closed.lock().unwrap().len(),
        recorder.opened.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_escalating_rounds_report_each_plan() {
    let (orchestrator, recorder) = orchestrator(FakeProvider::default());
    let initial = RoundPlan::new(vec![pg(), mysql()], 1, 2).unwrap();
    let schedule = RoundSchedule::escalating(initial, 3, ScalingRule::new(2, 1)).unwrap();

    let report = orchestrator.run(&schedule).await.unwrap();

    // Round k: (1 + (k-1)) workers x (2 + 2(k-1)) rows x 2 backends.
    let totals: Vec<u64> = report.rounds.iter().map(|r| r.total_rows).collect();
    assert_eq!(totals, vec![4, 16, 36]);
    assert_eq!(report.total_rows(), schedule.total_rows());
    assert_eq!(recorder.opened.load(Ordering::SeqCst), 2 + 4 + 6);
}

#[tokio::test]
async fn test_external_cancellation_stops_run() {
    let (orchestrator, recorder) = orchestrator(FakeProvider::default());
    let plan = RoundPlan::new(vec![pg()], 2, 5).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orchestrator
        .run_with_cancellation(&RoundSchedule::single(plan), cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.to_string(), "Cancelled");
    assert_eq!(recorder.opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_backend_dialect_is_rejected() {
    let (orchestrator, recorder) = orchestrator(FakeProvider::default());
    let plan = RoundPlan::new(vec![BackendId::new("oracle")], 1, 1).unwrap();

    let err = orchestrator
        .run(&RoundSchedule::single(plan))
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::InvalidPlan(_)));
    assert_eq!(recorder.opened.load(Ordering::SeqCst), 0);
}
