pub mod benchmark;
pub mod blockmodel;
pub mod cli;
pub mod config;
pub mod generator;
pub mod graph;
pub mod mcmc;
pub mod memory;
pub mod nmi;
pub mod objective;
pub mod optimizer;
pub mod output;
pub mod parser;
pub mod rng;

pub use blockmodel::BlockModel;
pub use graph::{Graph, Subgraph};
pub use optimizer::{bottom_up_sbp, top_down_sbp, ExecutionMode};
