use std::time::Instant;

use minisbm::generator::generate_sbm;
use minisbm::{bottom_up_sbp, top_down_sbp, ExecutionMode};

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values[values.len() / 2]
}

#[test]
#[ignore = "manual perf gate harness"]
fn sequential_vs_parallel_runtime_gate() {
    let (graph, _) = generate_sbm(1000, 5, 0.1, 0.005, 7);

    let runs = 3;
    let mut sequential = Vec::with_capacity(runs);
    let mut parallel = Vec::with_capacity(runs);

    for run in 0..runs {
        let seed = 100 + run as u64;

        let t0 = Instant::now();
        let bm = top_down_sbp(&graph, 5, 50, ExecutionMode::Sequential, None, seed);
        sequential.push(t0.elapsed().as_secs_f64());
        assert!(bm.num_blocks <= 5);

        let t1 = Instant::now();
        let bm = top_down_sbp(&graph, 5, 50, ExecutionMode::Parallel, None, seed);
        parallel.push(t1.elapsed().as_secs_f64());
        assert!(bm.num_blocks <= 5);
    }

    let ms = median(sequential);
    let mp = median(parallel);
    println!(
        "top-down sequential median: {ms:.6}s, parallel median: {mp:.6}s, speedup: {:.3}",
        ms / mp
    );

    let t0 = Instant::now();
    let _ = bottom_up_sbp(&graph, 5, ExecutionMode::Sequential, None, 1);
    let bu_seq = t0.elapsed().as_secs_f64();

    let t1 = Instant::now();
    let _ = bottom_up_sbp(&graph, 5, ExecutionMode::Parallel, None, 1);
    let bu_par = t1.elapsed().as_secs_f64();

    println!(
        "bottom-up sequential: {bu_seq:.6}s, parallel: {bu_par:.6}s, speedup: {:.3}",
        bu_seq / bu_par
    );
}
