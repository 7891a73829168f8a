use crate::graph::Graph;

/// Sentinel for "not assigned to any block yet".
pub const NULL_BLOCK: u32 = u32::MAX;

/// Partition state over a borrowed graph: the vertex -> block assignment,
/// per-block sizes and the K x K inter-block edge-count matrix. The matrix
/// counts ordered half-edges, so it stays symmetric and sums to 2E.
#[derive(Debug, Clone)]
pub struct BlockModel<'g> {
    pub graph: &'g Graph,
    pub num_blocks: usize,
    pub assignment: Vec<u32>,
    pub block_sizes: Vec<usize>,
    pub edge_matrix: Vec<Vec<i64>>,
    pub mcmc_seconds: f64,
}

impl<'g> BlockModel<'g> {
    /// Empty model with `num_blocks` declared blocks; every vertex starts
    /// unassigned. The caller fills `assignment` and runs `update_matrix`.
    pub fn new(graph: &'g Graph, num_blocks: usize) -> Self {
        Self {
            graph,
            num_blocks,
            assignment: vec![NULL_BLOCK; graph.vertex_count()],
            block_sizes: vec![0; num_blocks],
            edge_matrix: vec![vec![0; num_blocks]; num_blocks],
            mcmc_seconds: 0.0,
        }
    }

    /// Trivial partition: every vertex in block 0.
    pub fn one_block(graph: &'g Graph) -> Self {
        let mut bm = Self::new(graph, 1);
        bm.assignment.fill(0);
        bm.update_matrix();
        bm
    }

    /// Finest partition: vertex i in its own block i.
    pub fn singletons(graph: &'g Graph) -> Self {
        let n = graph.vertex_count();
        let mut bm = Self::new(graph, n);
        for (vertex, slot) in bm.assignment.iter_mut().enumerate() {
            *slot = vertex as u32;
        }
        bm.update_matrix();
        bm
    }

    /// Recompute `edge_matrix` and `block_sizes` from `assignment` in
    /// O(N + M). Out-of-range assignments or neighbour ids are skipped, not
    /// reported; a zero-block model is a no-op.
    pub fn update_matrix(&mut self) {
        if self.num_blocks == 0 {
            return;
        }

        for row in &mut self.edge_matrix {
            row.fill(0);
        }
        self.block_sizes.fill(0);

        for vertex in 0..self.assignment.len() {
            let block = self.assignment[vertex] as usize;
            if block >= self.num_blocks || vertex >= self.graph.vertex_count() {
                continue;
            }

            for &nbr in self.graph.neighbours(vertex) {
                if (nbr as usize) >= self.assignment.len() {
                    continue;
                }
                let nbr_block = self.assignment[nbr as usize] as usize;
                if nbr_block >= self.num_blocks {
                    continue;
                }
                self.edge_matrix[block][nbr_block] += 1;
            }

            self.block_sizes[block] += 1;
        }
    }

    /// Move one vertex to `new_block`, updating the edge matrix in O(deg v).
    /// The four-increment pattern keeps the matrix symmetric; a neighbour in
    /// the vertex's own block is handled by the same pattern, so intra-block
    /// counts stay consistent with `update_matrix`.
    pub fn move_vertex(&mut self, vertex: u32, new_block: u32) {
        let v = vertex as usize;
        if v >= self.assignment.len() {
            return;
        }

        let old_block = self.assignment[v];
        if old_block == new_block {
            return;
        }
        let old = old_block as usize;
        let new = new_block as usize;
        if old >= self.num_blocks || new >= self.num_blocks || v >= self.graph.vertex_count() {
            return;
        }

        for &nbr in self.graph.neighbours(v) {
            if (nbr as usize) >= self.assignment.len() {
                continue;
            }
            let c = self.assignment[nbr as usize] as usize;
            if c >= self.num_blocks {
                continue;
            }

            self.edge_matrix[old][c] -= 1;
            self.edge_matrix[c][old] -= 1;
            self.edge_matrix[new][c] += 1;
            self.edge_matrix[c][new] += 1;
        }

        self.block_sizes[old] -= 1;
        self.block_sizes[new] += 1;
        self.assignment[v] = new_block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn ring(n: usize) -> Graph {
        let mut g = Graph::with_vertices(n);
        for i in 0..n {
            g.add_edge(i as u32, ((i + 1) % n) as u32);
        }
        g
    }

    fn assert_invariants(bm: &BlockModel) {
        let n = bm.graph.vertex_count();
        let e = bm.graph.edge_count();

        assert_eq!(bm.block_sizes.iter().sum::<usize>(), n);

        let mut total = 0i64;
        for r in 0..bm.num_blocks {
            for s in 0..bm.num_blocks {
                assert!(bm.edge_matrix[r][s] >= 0);
                assert_eq!(bm.edge_matrix[r][s], bm.edge_matrix[s][r]);
                total += bm.edge_matrix[r][s];
            }
        }
        assert_eq!(total, 2 * e as i64);
    }

    #[test]
    fn one_block_accounts_for_all_edges() {
        let g = ring(8);
        let bm = BlockModel::one_block(&g);
        assert_eq!(bm.num_blocks, 1);
        assert_eq!(bm.block_sizes, vec![8]);
        assert_eq!(bm.edge_matrix[0][0], 16);
        assert_invariants(&bm);
    }

    #[test]
    fn singletons_spread_vertices() {
        let g = ring(5);
        let bm = BlockModel::singletons(&g);
        assert_eq!(bm.num_blocks, 5);
        assert!(bm.block_sizes.iter().all(|&s| s == 1));
        assert_invariants(&bm);
    }

    #[test]
    fn invariants_survive_random_move_sequences() {
        let g = ring(12);
        let mut bm = BlockModel::new(&g, 3);
        for (v, slot) in bm.assignment.iter_mut().enumerate() {
            *slot = (v % 3) as u32;
        }
        bm.update_matrix();

        let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let v = rng.gen_range(0..12u32);
            let b = rng.gen_range(0..3u32);
            bm.move_vertex(v, b);
            assert_invariants(&bm);
        }
    }

    #[test]
    fn update_matrix_is_idempotent() {
        let g = ring(9);
        let mut bm = BlockModel::new(&g, 3);
        for (v, slot) in bm.assignment.iter_mut().enumerate() {
            *slot = (v % 3) as u32;
        }
        bm.update_matrix();
        let matrix = bm.edge_matrix.clone();
        let sizes = bm.block_sizes.clone();
        bm.update_matrix();
        assert_eq!(bm.edge_matrix, matrix);
        assert_eq!(bm.block_sizes, sizes);
    }

    #[test]
    fn move_vertex_matches_full_recompute() {
        let g = ring(10);
        let mut incremental = BlockModel::new(&g, 4);
        for (v, slot) in incremental.assignment.iter_mut().enumerate() {
            *slot = (v % 4) as u32;
        }
        incremental.update_matrix();

        let mut rng = rand::rngs::SmallRng::seed_from_u64(11);
        for _ in 0..50 {
            let v = rng.gen_range(0..10u32);
            let b = rng.gen_range(0..4u32);
            incremental.move_vertex(v, b);

            let mut recomputed = BlockModel::new(&g, 4);
            recomputed.assignment = incremental.assignment.clone();
            recomputed.update_matrix();

            assert_eq!(incremental.edge_matrix, recomputed.edge_matrix);
            assert_eq!(incremental.block_sizes, recomputed.block_sizes);
        }
    }

    #[test]
    fn moves_to_same_or_invalid_block_are_ignored() {
        let g = ring(6);
        let mut bm = BlockModel::one_block(&g);
        let before = bm.edge_matrix.clone();
        bm.move_vertex(0, 0);
        bm.move_vertex(0, 5);
        bm.move_vertex(99, 0);
        assert_eq!(bm.edge_matrix, before);
        assert_eq!(bm.block_sizes, vec![6]);
    }

    #[test]
    fn zero_block_update_is_a_noop() {
        let g = Graph::with_vertices(0);
        let mut bm = BlockModel::new(&g, 0);
        bm.update_matrix();
        assert!(bm.edge_matrix.is_empty());
        assert!(bm.block_sizes.is_empty());
    }
}
