use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use crate::blockmodel::{BlockModel, NULL_BLOCK};
use crate::graph::{extract_subgraphs, Graph, Subgraph};
use crate::mcmc::mcmc_refine;
use crate::objective::{compute_h, delta_h_merge};
use crate::rng::{engine_rng, worker_seed};

const SPLIT_TOLERANCE_FACTOR: f64 = 0.05;
const SPLIT_MCMC_MULTIPLIER: usize = 10;

const MERGE_MCMC_MULTIPLIER: usize = 50;
const FORCED_MERGE_MCMC_MULTIPLIER: usize = 100;
const MAX_MERGE_MCMC_ITERATIONS: usize = 2000;
const MERGE_BATCH_FACTOR: f64 = 0.5;
const MCMC_THRESHOLD_DIVISOR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
        }
    }
}

#[inline]
fn env_worker_threads() -> Option<usize> {
    for var in ["MINISBM_WORKER_THREADS", "RAYON_NUM_THREADS"] {
        if let Some(v) = std::env::var_os(var) {
            if let Ok(s) = v.into_string() {
                if let Ok(n) = s.parse::<usize>() {
                    if n > 0 {
                        return Some(n);
                    }
                }
            }
        }
    }
    None
}

/// Sequential mode always runs one worker; parallel mode takes the explicit
/// request, then the environment, then the machine.
pub fn resolve_worker_threads(mode: ExecutionMode, requested: Option<usize>) -> usize {
    if mode == ExecutionMode::Sequential {
        return 1;
    }
    let default_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested
        .or_else(env_worker_threads)
        .unwrap_or(default_threads)
        .max(1)
}

fn run_with_workers<T: Send>(workers: usize, op: impl FnOnce() -> T + Send) -> T {
    if workers <= 1 {
        return op();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .expect("failed to build worker thread pool");
    pool.install(op)
}

/// One two-way split attempt: grow both sides from two random seed vertices,
/// assigning each remaining vertex (in shuffled order) to the side holding
/// the majority of its already-assigned neighbours, coin flip on ties.
fn snowball_proposal<R: Rng>(graph: &Graph, rng: &mut R) -> Vec<u32> {
    let n = graph.vertex_count();
    let mut assignment = vec![NULL_BLOCK; n];

    let seed0 = rng.gen_range(0..n);
    let mut seed1 = rng.gen_range(0..n);
    while seed1 == seed0 {
        seed1 = rng.gen_range(0..n);
    }
    assignment[seed0] = 0;
    assignment[seed1] = 1;

    let mut pending: Vec<u32> = (0..n as u32)
        .filter(|&v| assignment[v as usize] == NULL_BLOCK)
        .collect();
    pending.shuffle(rng);

    for vertex in pending {
        let mut score0 = 0usize;
        let mut score1 = 0usize;
        for &nbr in graph.neighbours(vertex as usize) {
            match assignment[nbr as usize] {
                0 => score0 += 1,
                1 => score1 += 1,
                _ => {}
            }
        }
        assignment[vertex as usize] = match score0.cmp(&score1) {
            Ordering::Greater => 0,
            Ordering::Less => 1,
            Ordering::Equal => rng.gen_range(0..2),
        };
    }

    assignment
}

/// Best two-way split of a subgraph over `proposals` independent snowball
/// attempts; returns the winning local assignment and its H. Subgraphs with
/// fewer than two vertices keep the trivial one-block partition.
pub fn connectivity_snowball_split(
    sub: &Subgraph,
    proposals: usize,
    workers: usize,
    seed: u64,
) -> (Vec<u32>, f64) {
    let n = sub.graph.vertex_count();
    if n < 2 || proposals == 0 {
        let bm = BlockModel::one_block(&sub.graph);
        let h = compute_h(&bm);
        return (bm.assignment, h);
    }

    let attempt = |proposal: usize| -> (Vec<u32>, f64) {
        let mut rng = engine_rng(worker_seed(seed, proposal as u64));
        let assignment = snowball_proposal(&sub.graph, &mut rng);
        let mut bm = BlockModel::new(&sub.graph, 2);
        bm.assignment = assignment;
        bm.update_matrix();
        let h = compute_h(&bm);
        (bm.assignment, h)
    };

    let attempts: Vec<(Vec<u32>, f64)> = if workers <= 1 {
        (0..proposals).map(attempt).collect()
    } else {
        (0..proposals).into_par_iter().map(attempt).collect()
    };

    // Proposal order is preserved by the indexed collect, so strict `<`
    // resolves H ties towards the lowest proposal index.
    let mut best: Option<(Vec<u32>, f64)> = None;
    for (assignment, h) in attempts {
        let replace = match &best {
            Some((_, best_h)) => h < *best_h,
            None => true,
        };
        if replace {
            best = Some((assignment, h));
        }
    }
    best.expect("at least one split attempt")
}

struct SplitCandidate {
    delta_h: f64,
    block: usize,
    split_assignment: Vec<u32>,
}

/// Divisive search: grow the block count from one towards `target_blocks`
/// by repeatedly splitting the block whose best snowball split lowers the
/// per-subgraph description length the most, then refining vertex-by-vertex.
pub fn top_down_sbp<'g>(
    graph: &'g Graph,
    target_blocks: usize,
    proposals_per_split: usize,
    mode: ExecutionMode,
    threads: Option<usize>,
    seed: u64,
) -> BlockModel<'g> {
    let workers = resolve_worker_threads(mode, threads);
    run_with_workers(workers, move || {
        top_down_inner(graph, target_blocks, proposals_per_split, workers, seed)
    })
}

fn top_down_inner<'g>(
    graph: &'g Graph,
    target_blocks: usize,
    proposals_per_split: usize,
    workers: usize,
    seed: u64,
) -> BlockModel<'g> {
    let mut bm = BlockModel::one_block(graph);
    let mut master = engine_rng(seed);

    while bm.num_blocks < target_blocks {
        let subgraphs = extract_subgraphs(graph, &bm.assignment, bm.num_blocks, workers);

        let mut candidates: Vec<SplitCandidate> = Vec::new();
        for (block, sub) in subgraphs.iter().enumerate() {
            if sub.graph.vertex_count() < 2 {
                continue;
            }

            let single = BlockModel::one_block(&sub.graph);
            let h_before = compute_h(&single);

            let (split_assignment, h_after) = connectivity_snowball_split(
                sub,
                proposals_per_split,
                workers,
                master.gen::<u64>(),
            );

            // Permissive window: early H estimates on small blocks are noisy.
            let tolerance = SPLIT_TOLERANCE_FACTOR * h_before.abs();
            if h_after < h_before + tolerance {
                candidates.push(SplitCandidate {
                    delta_h: h_after - h_before,
                    block,
                    split_assignment,
                });
            }
        }

        if candidates.is_empty() {
            break;
        }

        // Candidates arrive in block order; strict `<` keeps the lowest
        // block id among equal deltas.
        let mut best = 0usize;
        for i in 1..candidates.len() {
            if candidates[i].delta_h < candidates[best].delta_h {
                best = i;
            }
        }
        let chosen = &candidates[best];
        let sub = &subgraphs[chosen.block];

        let new_block = bm.num_blocks as u32;
        bm.num_blocks += 1;
        for row in &mut bm.edge_matrix {
            row.push(0);
        }
        bm.edge_matrix.push(vec![0; bm.num_blocks]);
        bm.block_sizes.push(0);

        for (local, &global) in sub.global_vertex.iter().enumerate() {
            if chosen.split_assignment[local] == 1 {
                bm.assignment[global as usize] = new_block;
            }
        }
        bm.update_matrix();

        mcmc_refine(
            &mut bm,
            SPLIT_MCMC_MULTIPLIER * graph.vertex_count(),
            workers,
            master.gen::<u64>(),
        );
    }

    bm
}

type MergeProposal = (usize, usize, f64);

fn merge_proposal_order(a: &MergeProposal, b: &MergeProposal) -> Ordering {
    a.2.partial_cmp(&b.2)
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
        .then(a.1.cmp(&b.1))
}

/// Agglomerative search: start from singletons and merge batches of
/// pairwise-disjoint block pairs by their merge delta until `target_blocks`
/// remain, refining as the block count comes down.
pub fn bottom_up_sbp<'g>(
    graph: &'g Graph,
    target_blocks: usize,
    mode: ExecutionMode,
    threads: Option<usize>,
    seed: u64,
) -> BlockModel<'g> {
    let workers = resolve_worker_threads(mode, threads);
    run_with_workers(workers, move || {
        bottom_up_inner(graph, target_blocks, workers, seed)
    })
}

fn bottom_up_inner<'g>(
    graph: &'g Graph,
    target_blocks: usize,
    workers: usize,
    seed: u64,
) -> BlockModel<'g> {
    let mut bm = BlockModel::singletons(graph);
    let target = target_blocks.max(1);
    let mut master = engine_rng(seed);

    // No refinement at K = N; a full H evaluation per proposed move is far
    // too expensive before the first merge rounds shrink the matrix.

    while bm.num_blocks > target {
        let k = bm.num_blocks;

        let scan = |c: usize| -> Option<MergeProposal> {
            if bm.block_sizes[c] == 0 {
                return None;
            }
            let mut best_delta = f64::INFINITY;
            let mut best_partner = None;
            for other in 0..k {
                if other == c || bm.block_sizes[other] == 0 {
                    continue;
                }
                if bm.edge_matrix[c][other] == 0 && bm.edge_matrix[other][c] == 0 {
                    continue;
                }
                let delta = delta_h_merge(&bm, c as u32, other as u32);
                if delta < best_delta {
                    best_delta = delta;
                    best_partner = Some(other);
                }
            }
            match best_partner {
                Some(partner) if best_delta < 0.0 => Some((c, partner, best_delta)),
                _ => None,
            }
        };

        let mut proposals: Vec<MergeProposal> = if workers <= 1 {
            (0..k).filter_map(scan).collect()
        } else {
            (0..k).into_par_iter().filter_map(scan).collect()
        };

        // No strictly improving merge left: force the least-bad pair over
        // all block pairs, connected or not, so the target stays reachable.
        let mut forced_merge = false;
        if proposals.is_empty() {
            let forced_scan = |c1: usize| -> Option<MergeProposal> {
                if bm.block_sizes[c1] == 0 {
                    return None;
                }
                let mut best: Option<MergeProposal> = None;
                for c2 in (c1 + 1)..k {
                    if bm.block_sizes[c2] == 0 {
                        continue;
                    }
                    let candidate = (c1, c2, delta_h_merge(&bm, c1 as u32, c2 as u32));
                    let replace = match &best {
                        Some(current) => merge_proposal_order(&candidate, current) == Ordering::Less,
                        None => true,
                    };
                    if replace {
                        best = Some(candidate);
                    }
                }
                best
            };

            let per_block: Vec<MergeProposal> = if workers <= 1 {
                (0..k).filter_map(forced_scan).collect()
            } else {
                (0..k).into_par_iter().filter_map(forced_scan).collect()
            };

            if let Some(best) = per_block
                .into_iter()
                .min_by(|a, b| merge_proposal_order(a, b))
            {
                proposals.push(best);
                forced_merge = true;
            }
        }

        if proposals.is_empty() {
            break;
        }

        proposals.sort_by(merge_proposal_order);

        // Disjoint batch, capped so the target is never overshot.
        let cap = ((k as f64 * MERGE_BATCH_FACTOR) as usize).min(k - target);
        let mut used = vec![false; k];
        let mut batch: Vec<(u32, u32)> = Vec::new();
        for &(c1, c2, _) in &proposals {
            if used[c1] || used[c2] {
                continue;
            }
            used[c1] = true;
            used[c2] = true;
            batch.push((c1 as u32, c2 as u32));
            if batch.len() >= cap {
                break;
            }
        }

        for &(c1, c2) in &batch {
            for slot in bm.assignment.iter_mut() {
                if *slot == c2 {
                    *slot = c1;
                }
            }
        }

        renumber_blocks(&mut bm);

        if bm.num_blocks <= graph.vertex_count() / MCMC_THRESHOLD_DIVISOR {
            let mut iterations = (MERGE_MCMC_MULTIPLIER * bm.num_blocks).min(MAX_MERGE_MCMC_ITERATIONS);
            if forced_merge {
                iterations =
                    (FORCED_MERGE_MCMC_MULTIPLIER * bm.num_blocks).min(MAX_MERGE_MCMC_ITERATIONS);
            }
            if bm.num_blocks <= target + 2 {
                iterations = (2 * FORCED_MERGE_MCMC_MULTIPLIER * bm.num_blocks)
                    .min(MAX_MERGE_MCMC_ITERATIONS);
            }
            mcmc_refine(&mut bm, iterations, workers, master.gen::<u64>());
        }

        if bm.num_blocks <= target {
            break;
        }
    }

    if bm.num_blocks == target {
        let iterations =
            (FORCED_MERGE_MCMC_MULTIPLIER * bm.num_blocks).min(MAX_MERGE_MCMC_ITERATIONS);
        mcmc_refine(&mut bm, iterations, workers, master.gen::<u64>());
    }

    bm
}

/// Collapse the block id space to the dense range [0, K') over the ids still
/// in use, in ascending id order, and recount the matrix.
fn renumber_blocks(bm: &mut BlockModel) {
    let k = bm.num_blocks;
    let mut in_use = vec![false; k];
    for &block in &bm.assignment {
        if (block as usize) < k {
            in_use[block as usize] = true;
        }
    }

    let mut old_to_new = vec![NULL_BLOCK; k];
    let mut next = 0u32;
    for (old, &used) in in_use.iter().enumerate() {
        if used {
            old_to_new[old] = next;
            next += 1;
        }
    }

    for slot in bm.assignment.iter_mut() {
        if (*slot as usize) < k {
            *slot = old_to_new[*slot as usize];
        }
    }

    bm.num_blocks = next as usize;
    bm.edge_matrix = vec![vec![0; bm.num_blocks]; bm.num_blocks];
    bm.block_sizes = vec![0; bm.num_blocks];
    bm.update_matrix();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cliques(per_block: usize) -> Graph {
        let n = 2 * per_block;
        let mut g = Graph::with_vertices(n);
        for i in 0..per_block {
            for j in (i + 1)..per_block {
                g.add_edge(i as u32, j as u32);
                g.add_edge((per_block + i) as u32, (per_block + j) as u32);
            }
        }
        g
    }

    #[test]
    fn sequential_mode_forces_one_worker() {
        assert_eq!(resolve_worker_threads(ExecutionMode::Sequential, Some(8)), 1);
        assert!(resolve_worker_threads(ExecutionMode::Parallel, Some(3)) == 3);
    }

    #[test]
    fn snowball_recovers_a_clean_cut() {
        let g = two_cliques(8);
        let sub = Subgraph {
            global_vertex: (0..16).collect(),
            graph: g,
        };
        let (assignment, _) = connectivity_snowball_split(&sub, 50, 1, 17);

        let left = assignment[0];
        assert!(assignment[..8].iter().all(|&b| b == left));
        assert!(assignment[8..].iter().all(|&b| b == 1 - left));
    }

    #[test]
    fn snowball_on_tiny_subgraph_stays_one_block() {
        let sub = Subgraph {
            graph: Graph::with_vertices(1),
            global_vertex: vec![3],
        };
        let (assignment, _) = connectivity_snowball_split(&sub, 10, 1, 1);
        assert_eq!(assignment, vec![0]);
    }

    #[test]
    fn top_down_respects_block_bound() {
        let g = two_cliques(6);
        let bm = top_down_sbp(&g, 4, 20, ExecutionMode::Sequential, None, 5);
        assert!(bm.num_blocks >= 1 && bm.num_blocks <= 4);
    }

    #[test]
    fn top_down_target_one_is_identity() {
        let g = two_cliques(5);
        let bm = top_down_sbp(&g, 1, 10, ExecutionMode::Sequential, None, 5);
        assert_eq!(bm.num_blocks, 1);
        assert!(bm.assignment.iter().all(|&b| b == 0));
    }

    #[test]
    fn bottom_up_reaches_the_target_on_disconnected_cliques() {
        let g = two_cliques(6);
        let bm = bottom_up_sbp(&g, 2, ExecutionMode::Sequential, None, 23);
        assert_eq!(bm.num_blocks, 2);
        // No cross edges, so each block must stay inside one clique.
        let left = bm.assignment[0];
        assert!(bm.assignment[..6].iter().all(|&b| b == left));
        assert!(bm.assignment[6..].iter().all(|&b| b == 1 - left));
    }

    #[test]
    fn bottom_up_stops_at_singletons_when_target_is_n() {
        let g = two_cliques(3);
        let bm = bottom_up_sbp(&g, 6, ExecutionMode::Sequential, None, 2);
        assert_eq!(bm.num_blocks, 6);
    }

    #[test]
    fn renumbering_compacts_ids_in_ascending_order() {
        let g = two_cliques(3);
        let mut bm = BlockModel::new(&g, 5);
        bm.assignment = vec![4, 4, 4, 1, 1, 1];
        bm.update_matrix();
        renumber_blocks(&mut bm);
        assert_eq!(bm.num_blocks, 2);
        assert_eq!(bm.assignment, vec![1, 1, 1, 0, 0, 0]);
    }
}
