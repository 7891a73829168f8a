use std::path::PathBuf;

use crate::optimizer::ExecutionMode;
use crate::parser::GeneratorKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub raw_args: String,
    pub config_file: PathBuf,
    pub results_file: PathBuf,
    pub generator: GeneratorKind,
    pub runs: usize,
    pub proposals_per_split: usize,
    pub seed: Option<u64>,
    pub worker_threads: Option<usize>,
    pub sequential_only: bool,
    pub parallel_only: bool,
    pub silent: bool,
}

impl Config {
    pub fn execution_modes(&self) -> Vec<ExecutionMode> {
        if self.sequential_only {
            vec![ExecutionMode::Sequential]
        } else if self.parallel_only {
            vec![ExecutionMode::Parallel]
        } else {
            vec![ExecutionMode::Sequential, ExecutionMode::Parallel]
        }
    }
}
