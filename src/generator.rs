use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::graph::Graph;
use crate::rng::engine_rng;

/// Planted-partition graph: vertex i carries ground-truth label i mod k and
/// each vertex pair is wired with probability `p_in` inside a block,
/// `p_out` across blocks.
pub fn generate_sbm(
    n: usize,
    k: usize,
    p_in: f64,
    p_out: f64,
    seed: u64,
) -> (Graph, Vec<u32>) {
    let k = k.max(1);
    let labels: Vec<u32> = (0..n).map(|v| (v % k) as u32).collect();

    let mut rng = engine_rng(seed);
    let mut graph = Graph::with_vertices(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let p = if labels[i] == labels[j] { p_in } else { p_out };
            if rng.gen::<f64>() < p {
                graph.add_edge(i as u32, j as u32);
            }
        }
    }

    (graph, labels)
}

#[derive(Debug, Clone, Copy)]
pub struct LfrConfig {
    pub n: usize,
    pub tau1: f64,
    pub tau2: f64,
    pub mu: f64,
    pub avg_degree: usize,
    pub min_comm_size: usize,
}

fn sample_powerlaw<R: Rng>(xmin: f64, tau: f64, rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    (xmin * (1.0 - r).powf(-1.0 / (tau - 1.0))) as usize
}

/// LFR-style benchmark graph: power-law degrees rescaled to the target
/// average, power-law community sizes, and degree mass split into internal
/// and external stubs by the mixing parameter. Returns the graph, the
/// ground-truth labels and the community count the sampler settled on.
pub fn generate_lfr(cfg: &LfrConfig, seed: u64) -> (Graph, Vec<u32>, usize) {
    let n = cfg.n;
    let mut rng = engine_rng(seed);
    let mut graph = Graph::with_vertices(n);

    let mut degree: Vec<usize> = (0..n)
        .map(|_| sample_powerlaw(1.0, cfg.tau1, &mut rng).max(1))
        .collect();
    let mean_degree = degree.iter().sum::<usize>() as f64 / n.max(1) as f64;
    if mean_degree > 0.0 {
        let scale = cfg.avg_degree as f64 / mean_degree;
        for d in degree.iter_mut() {
            *d = ((*d as f64 * scale) as usize).max(1);
        }
    }

    let mut comm_sizes: Vec<usize> = Vec::new();
    let mut total = 0usize;
    while total < n {
        let size = sample_powerlaw(cfg.min_comm_size as f64, cfg.tau2, &mut rng)
            .max(cfg.min_comm_size.max(1));
        comm_sizes.push(size);
        total += size;
    }
    if let Some(last) = comm_sizes.last_mut() {
        *last = last.saturating_sub(total - n);
    }
    comm_sizes.retain(|&size| size > 0);

    let mut labels = vec![0u32; n];
    let mut vertex = 0usize;
    for (community, &size) in comm_sizes.iter().enumerate() {
        for _ in 0..size {
            if vertex < n {
                labels[vertex] = community as u32;
                vertex += 1;
            }
        }
    }

    let mut internal_stubs: Vec<Vec<u32>> = vec![Vec::new(); comm_sizes.len()];
    let mut external_stubs: Vec<u32> = Vec::new();
    for v in 0..n {
        let internal = ((1.0 - cfg.mu) * degree[v] as f64) as usize;
        let external = degree[v] - internal.min(degree[v]);
        let community = labels[v] as usize;
        internal_stubs[community].extend(std::iter::repeat(v as u32).take(internal));
        external_stubs.extend(std::iter::repeat(v as u32).take(external));
    }

    let mut seen: FxHashSet<(u32, u32)> = FxHashSet::default();
    let mut wire = |graph: &mut Graph, u: u32, v: u32| {
        if u == v {
            return;
        }
        let key = (u.min(v), u.max(v));
        if seen.insert(key) {
            graph.add_edge(u, v);
        }
    };

    for stubs in internal_stubs.iter_mut() {
        stubs.shuffle(&mut rng);
        for pair in stubs.chunks_exact(2) {
            wire(&mut graph, pair[0], pair[1]);
        }
    }

    external_stubs.shuffle(&mut rng);
    for pair in external_stubs.chunks_exact(2) {
        let (u, v) = (pair[0], pair[1]);
        if labels[u as usize] != labels[v as usize] {
            wire(&mut graph, u, v);
        }
    }

    let communities = comm_sizes.len();
    (graph, labels, communities)
}
