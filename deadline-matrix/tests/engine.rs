use std::sync::{Arc, Mutex};
use std::time::Duration;

use deadline_matrix::{Engine, EngineConfig, Error, Matrix, Outcome, Unpinned};

const AMPLE: Duration = Duration::from_secs(10);

fn engine(workers: usize) -> Engine {
    Engine::new(EngineConfig::new().with_workers(workers).unwrap())
}

fn sample(rows: usize, cols: usize) -> Matrix {
    let data = (0..rows * cols).map(|i| i as f64 * 0.5 - 7.0).collect();
    Matrix::from_vec(rows, cols, data).unwrap()
}

#[test]
fn test_square_plus_one_with_ample_deadline() {
    let mut m = Matrix::from_rows(vec![
        vec![1.0, 2.0],
        vec![3.0, 4.0],
        vec![5.0, 6.0],
        vec![7.0, 8.0],
    ])
    .unwrap();

    let outcome = deadline_matrix::transform(&mut m, AMPLE, |x| x * x + 1.0).unwrap();

    assert_eq!(outcome, Outcome::Success);
    let expected = Matrix::from_rows(vec![
        vec![2.0, 5.0],
        vec![10.0, 17.0],
        vec![26.0, 37.0],
        vec![50.0, 65.0],
    ])
    .unwrap();
    assert_eq!(m, expected);
}

#[test]
fn test_result_independent_of_worker_count() {
    let f = |x: f64| x.sin() * 3.0 + x;
    let mut results = Vec::new();
    for workers in [1, 2, 3, 7, 16] {
        let mut m = sample(97, 13);
        let report = engine(workers).execute(&mut m, AMPLE, f).unwrap();
        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.rows_completed, 97);
        assert_eq!(report.elements_completed, 97 * 13);
        results.push(m);
    }
    for m in &results[1..] {
        assert_eq!(m, &results[0]);
    }
}

#[test]
fn test_zero_deadline_leaves_rows_whole() {
    let original = sample(40, 8);
    let mut m = original.clone();

    let report = engine(4)
        .execute(&mut m, Duration::ZERO, |x| x + 100.0)
        .unwrap();

    assert_eq!(report.outcome, Outcome::DeadlineExceeded);
    for i in 0..m.rows() {
        let untouched = m.row(i) == original.row(i);
        let done = m
            .row(i)
            .iter()
            .zip(original.row(i))
            .all(|(after, before)| *after == before + 100.0);
        assert!(untouched || done, "row {i} partially transformed");
    }
    // The flag is set before any worker starts.
    assert_eq!(report.rows_completed, 0);
    assert_eq!(m, original);
}

#[test]
fn test_tight_deadline_stops_between_rows() {
    let rows = 64;
    let cols = 4;
    let mut m = Matrix::from_vec(rows, cols, vec![1.0; rows * cols]).unwrap();

    let report = engine(2)
        .execute(&mut m, Duration::from_millis(20), |x| {
            std::thread::sleep(Duration::from_millis(1));
            x + 1.0
        })
        .unwrap();

    assert_eq!(report.outcome, Outcome::DeadlineExceeded);
    assert!(report.rows_completed < rows);

    let mut transformed = 0;
    for i in 0..rows {
        let row = m.row(i);
        if row.iter().all(|&v| v == 2.0) {
            transformed += 1;
        } else {
            assert!(row.iter().all(|&v| v == 1.0), "row {i} partially transformed: {row:?}");
        }
    }
    assert_eq!(transformed, report.rows_completed);
}

#[test]
fn test_deadline_fired_during_last_row_still_exceeded() {
    let mut m = Matrix::from_vec(1, 1, vec![1.0]).unwrap();

    let report = engine(1)
        .execute(&mut m, Duration::from_millis(20), |x| {
            std::thread::sleep(Duration::from_millis(100));
            x + 1.0
        })
        .unwrap();

    // The only row was already started when the timer fired, so it runs to
    // the end, but the outcome still reflects the missed deadline.
    assert_eq!(report.outcome, Outcome::DeadlineExceeded);
    assert_eq!(report.rows_total, 1);
    assert_eq!(report.rows_completed, 1);
    assert_eq!(m.get(0, 0), 2.0);
}

#[test]
fn test_transform_twice_is_composition_not_idempotent() {
    let f = |x: f64| x * x + 1.0;

    let mut twice = sample(10, 3);
    let e = engine(3);
    assert!(e.execute(&mut twice, AMPLE, f).unwrap().outcome.is_success());
    let once = twice.clone();
    assert!(e.execute(&mut twice, AMPLE, f).unwrap().outcome.is_success());

    let mut composed = sample(10, 3);
    assert!(e.execute(&mut composed, AMPLE, |x| f(f(x))).unwrap().outcome.is_success());

    assert_eq!(twice, composed);
    assert_ne!(twice, once);
}

#[test]
fn test_placement_runs_once_per_busy_worker() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let config = EngineConfig::new()
        .with_workers(3)
        .unwrap()
        .with_placement(move |worker: usize| recorder.lock().unwrap().push(worker));

    let mut m = sample(6, 2);
    let report = Engine::new(config).execute(&mut m, AMPLE, |x| x).unwrap();
    assert_eq!(report.outcome, Outcome::Success);

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2]);
}

#[test]
fn test_unpinned_placement_matches_default() {
    let f = |x: f64| x * 3.0 - 1.0;

    let mut pinned = sample(12, 5);
    let config = EngineConfig::new().with_workers(4).unwrap().with_placement(Unpinned);
    let report = Engine::new(config).execute(&mut pinned, AMPLE, f).unwrap();
    assert_eq!(report.outcome, Outcome::Success);

    let mut plain = sample(12, 5);
    assert!(engine(4).execute(&mut plain, AMPLE, f).unwrap().outcome.is_success());

    assert_eq!(pinned, plain);
}

#[test]
fn test_spawn_error_message() {
    let err = Error::Spawn(std::io::Error::other("no threads left"));
    assert_eq!(err.to_string(), "failed to spawn thread: no threads left");
}

#[test]
#[should_panic(expected = "boom")]
fn test_transform_panic_reaches_caller() {
    let mut m = sample(8, 2);
    let _ = engine(2).execute(&mut m, AMPLE, |x| {
        if x > 0.0 {
            panic!("boom");
        }
        x
    });
}

#[tokio::test]
async fn test_execute_owned_returns_matrix() {
    let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();

    let (m, report) = engine(2)
        .execute_owned(m, AMPLE, |x| x * x + 1.0)
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.rows_total, 2);
    assert_eq!(m.into_vec(), vec![2.0, 5.0, 10.0, 17.0]);
}

#[tokio::test]
async fn test_execute_owned_zero_deadline() {
    let (m, report) = engine(4)
        .execute_owned(sample(16, 4), Duration::ZERO, |x| x * 2.0)
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::DeadlineExceeded);
    assert_eq!(m, sample(16, 4));
}
