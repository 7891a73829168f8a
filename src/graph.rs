use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Undirected simple graph stored as per-vertex neighbour lists. Each edge
/// {u, v} appears once in `adjacency[u]` and once in `adjacency[v]`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub adjacency: Vec<Vec<u32>>,
}

impl Graph {
    pub fn with_vertices(vertex_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); vertex_count],
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        let half_edges: usize = self.adjacency.iter().map(|nbrs| nbrs.len()).sum();
        half_edges / 2
    }

    #[inline]
    pub fn neighbours(&self, vertex: usize) -> &[u32] {
        &self.adjacency[vertex]
    }

    #[inline]
    pub fn degree(&self, vertex: usize) -> usize {
        self.adjacency[vertex].len()
    }

    pub fn add_edge(&mut self, u: u32, v: u32) {
        self.adjacency[u as usize].push(v);
        self.adjacency[v as usize].push(u);
    }
}

/// Induced subgraph plus the order-preserving local -> global vertex mapping.
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    pub graph: Graph,
    pub global_vertex: Vec<u32>,
}

/// Materialise one induced subgraph per block. An edge survives iff both of
/// its endpoints stay in the same block, so no edge lands in two subgraphs.
pub fn extract_subgraphs(
    graph: &Graph,
    assignment: &[u32],
    num_blocks: usize,
    workers: usize,
) -> Vec<Subgraph> {
    let mut members: Vec<Vec<u32>> = vec![Vec::new(); num_blocks];
    for (vertex, &block) in assignment.iter().enumerate() {
        if (block as usize) < num_blocks {
            members[block as usize].push(vertex as u32);
        }
    }

    let build = |block: usize| -> Subgraph {
        let global_vertex = members[block].clone();
        let mut local_of: FxHashMap<u32, u32> = FxHashMap::default();
        local_of.reserve(global_vertex.len());
        for (local, &global) in global_vertex.iter().enumerate() {
            local_of.insert(global, local as u32);
        }

        let mut sub = Graph::with_vertices(global_vertex.len());
        for (local, &global) in global_vertex.iter().enumerate() {
            for &nbr in graph.neighbours(global as usize) {
                if (nbr as usize) < assignment.len() && assignment[nbr as usize] == block as u32 {
                    sub.adjacency[local].push(local_of[&nbr]);
                }
            }
        }

        Subgraph {
            graph: sub,
            global_vertex,
        }
    };

    if workers <= 1 {
        (0..num_blocks).map(build).collect()
    } else {
        (0..num_blocks).into_par_iter().map(build).collect()
    }
}
