use std::time::Instant;

use ring_life::ringlife::{NullSink, RingLife, RingLifeConfig};

const BENCH_SEED: u64 = 0x5EED_1234_ABCD_EF01;

fn bench_ring(size: usize, workers: usize, steps: u64) -> (f64, u64) {
    let config = RingLifeConfig::default()
        .size(size)
        .probability(42)
        .steps(steps)
        .workers(workers)
        .seed(BENCH_SEED)
        .snapshot_every(0);
    let engine = RingLife::with_config(config).expect("valid bench config");

    let start = Instant::now();
    let report = engine.run(&mut NullSink).expect("bench run failed");
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    (total_ms, report.population)
}

fn main() {
    let scales: &[(usize, u64)] = &[(256, 200), (512, 100), (1024, 50), (2048, 20)];
    let max_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let worker_counts: Vec<usize> = [1, 2, 4, 8, 16]
        .into_iter()
        .filter(|&w| w <= max_workers)
        .collect();

    println!(
        "{:<10} {:>8} {:>8} {:>12} {:>10} {:>10}",
        "Grid", "Workers", "Iters", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(64));

    for &(size, iters) in scales {
        for &workers in &worker_counts {
            let (total_ms, pop) = bench_ring(size, workers, iters);
            let avg_ms = total_ms / iters as f64;
            println!(
                "{:<10} {:>8} {:>8} {:>12.1} {:>10.4} {:>10}",
                format!("{}x{}", size, size),
                workers,
                iters,
                total_ms,
                avg_ms,
                pop
            );
        }
    }
}
