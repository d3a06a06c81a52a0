use std::env;
use std::time::Duration;

use deadline_matrix::{Engine, EngineConfig, Matrix, Outcome};
use rand::Rng;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();

    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        usage(&args[0]);
        return Ok(());
    }

    let rows: usize = args.get(1).unwrap_or(&"2000".to_string()).parse()?;
    let cols: usize = args.get(2).unwrap_or(&"2000".to_string()).parse()?;
    let deadline_ms: u64 = args.get(3).unwrap_or(&"5000".to_string()).parse()?;

    let mut config = EngineConfig::new();
    if let Some(workers) = args.get(4) {
        config = config.with_workers(workers.parse()?)?;
    }
    let deadline = Duration::from_millis(deadline_ms);

    let mut matrix = Matrix::new(rows, cols)?;
    let mut rng = rand::thread_rng();
    for i in 0..rows {
        for elem in matrix.row_mut(i) {
            *elem = rng.gen_range(0.0..10.0);
        }
    }

    println!(
        "Transforming {}x{} matrix with {} workers, deadline {:?}",
        rows,
        cols,
        config.workers(),
        deadline
    );
    tracing::info!(rows, cols, ?deadline, "starting transform");

    let engine = Engine::new(config);
    let (matrix, report) = engine
        .execute_owned(matrix, deadline, |x| x * x + 1.0)
        .await?;

    println!("Started at: {}", report.started_at);
    println!("Elapsed: {:?}", report.elapsed);
    println!(
        "Rows completed: {}/{}",
        report.rows_completed, report.rows_total
    );
    println!("Throughput: {:.2} M elements/s", report.throughput() / 1e6);

    match report.outcome {
        Outcome::Success => {
            println!("Computation completed within the deadline");
            if rows > 0 && cols > 0 {
                println!("First element: {}", matrix.get(0, 0));
            }
        }
        Outcome::DeadlineExceeded => {
            eprintln!("Computation failed: deadline exceeded");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn usage(program: &str) {
    eprintln!("Usage: {} [rows] [cols] [deadline_ms] [workers]", program);
    eprintln!("  rows         - matrix rows (default 2000)");
    eprintln!("  cols         - matrix columns (default 2000)");
    eprintln!("  deadline_ms  - deadline in milliseconds (default 5000)");
    eprintln!("  workers      - worker threads (default: available parallelism)");
}
