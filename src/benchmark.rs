use std::time::Instant;

use crate::config::Config;
use crate::generator::{generate_lfr, generate_sbm};
use crate::graph::Graph;
use crate::memory::peak_memory_mb;
use crate::nmi::calculate_nmi;
use crate::objective::{compute_h, compute_h_normalized};
use crate::optimizer::{bottom_up_sbp, top_down_sbp, ExecutionMode};
use crate::output::ResultsWriter;
use crate::parser::{parse_config_file, GraphConfig};
use crate::rng::{entropy_seed, worker_seed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    TopDown,
    BottomUp,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::TopDown => "TopDown",
            Algorithm::BottomUp => "BottomUp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub graph_id: usize,
    pub num_vertices: usize,
    pub num_edges: usize,
    pub target_clusters: usize,
    pub algorithm: Algorithm,
    pub execution_mode: ExecutionMode,
    pub run_number: usize,
    pub runtime_sec: f64,
    pub mcmc_runtime_sec: f64,
    pub memory_mb: u64,
    pub nmi: f64,
    pub mdl_raw: f64,
    pub mdl_norm: f64,
    pub clusters_found: usize,
}

fn realize_graph(config: &GraphConfig, seed: u64) -> (Graph, Vec<u32>, usize) {
    match config {
        GraphConfig::Standard { n, k, p_in, p_out } => {
            let (graph, labels) = generate_sbm(*n, *k, *p_in, *p_out, seed);
            (graph, labels, *k)
        }
        GraphConfig::Lfr(cfg) => {
            let (graph, labels, communities) = generate_lfr(cfg, seed);
            (graph, labels, communities)
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_single_benchmark(
    graph: &Graph,
    true_labels: &[u32],
    graph_id: usize,
    target_clusters: usize,
    algorithm: Algorithm,
    execution_mode: ExecutionMode,
    run_number: usize,
    proposals_per_split: usize,
    threads: Option<usize>,
    engine_seed: u64,
) -> BenchmarkResult {
    let started = Instant::now();
    let bm = match algorithm {
        Algorithm::TopDown => top_down_sbp(
            graph,
            target_clusters,
            proposals_per_split,
            execution_mode,
            threads,
            engine_seed,
        ),
        Algorithm::BottomUp => {
            bottom_up_sbp(graph, target_clusters, execution_mode, threads, engine_seed)
        }
    };
    let runtime_sec = started.elapsed().as_secs_f64();

    BenchmarkResult {
        graph_id,
        num_vertices: graph.vertex_count(),
        num_edges: graph.edge_count(),
        target_clusters,
        algorithm,
        execution_mode,
        run_number,
        runtime_sec,
        mcmc_runtime_sec: bm.mcmc_seconds,
        memory_mb: peak_memory_mb(),
        nmi: calculate_nmi(true_labels, &bm.assignment),
        mdl_raw: compute_h(&bm),
        mdl_norm: compute_h_normalized(&bm),
        clusters_found: bm.num_blocks,
    }
}

/// Run the whole configured suite: every graph configuration, `runs` graph
/// realisations each, and for each realisation both algorithms in every
/// requested execution mode. One CSV row per run, flushed as it lands.
pub fn run_suite(cfg: &Config) -> Result<(), String> {
    let configs = parse_config_file(&cfg.config_file, cfg.generator)?;
    let modes = cfg.execution_modes();
    let base_seed = cfg.seed.unwrap_or_else(entropy_seed);

    let mut csv = ResultsWriter::create(&cfg.results_file)?;

    if !cfg.silent {
        let started: chrono::DateTime<chrono::Local> = chrono::Local::now();
        println!("=== SBP benchmark suite ===");
        println!("started at {}", started.format("%Y-%m-%d %H:%M:%S"));
        println!(
            "{} graph configuration(s), {} run(s) each, modes: {}",
            configs.len(),
            cfg.runs,
            modes
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("/")
        );
    }

    let mut engine_call = 0u64;
    for (graph_id, config) in configs.iter().enumerate() {
        for run in 0..cfg.runs {
            let graph_seed = (graph_id * 1000 + run) as u64;
            let (graph, labels, target) = realize_graph(config, graph_seed);

            for &mode in &modes {
                for algorithm in [Algorithm::TopDown, Algorithm::BottomUp] {
                    let engine_seed = worker_seed(base_seed, engine_call);
                    engine_call += 1;

                    let result = run_single_benchmark(
                        &graph,
                        &labels,
                        graph_id,
                        target,
                        algorithm,
                        mode,
                        run,
                        cfg.proposals_per_split,
                        cfg.worker_threads,
                        engine_seed,
                    );

                    if !cfg.silent {
                        println!(
                            "graph {} run {}/{} [{} {}]: {:.3}s, K={}, NMI={:.4}",
                            graph_id,
                            run + 1,
                            cfg.runs,
                            algorithm.as_str(),
                            mode.as_str(),
                            result.runtime_sec,
                            result.clusters_found,
                            result.nmi
                        );
                    }

                    csv.append(&result)?;
                }
            }
        }
    }

    if !cfg.silent {
        println!(
            "Benchmark complete, results written to {}",
            cfg.results_file.display()
        );
    }

    Ok(())
}
