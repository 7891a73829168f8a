use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::benchmark::BenchmarkResult;

pub const CSV_HEADER: &str = "graph_id,num_vertices,num_edges,target_clusters,algorithm,\
execution_mode,run_number,runtime_sec,mcmc_runtime_sec,memory_mb,nmi,mdl_raw,mdl_norm,\
clusters_found";

/// Appends one row per finished run and flushes immediately, so a partial
/// file is always a readable prefix of the final one.
pub struct ResultsWriter {
    writer: BufWriter<File>,
}

impl ResultsWriter {
    pub fn create(path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    format!("Can't create directory '{}': {}", parent.display(), e)
                })?;
            }
        }

        let file = File::create(path)
            .map_err(|e| format!("Error opening file '{}': {}", path.display(), e))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", CSV_HEADER).map_err(|e| e.to_string())?;
        writer.flush().map_err(|e| e.to_string())?;

        Ok(Self { writer })
    }

    pub fn append(&mut self, result: &BenchmarkResult) -> Result<(), String> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{:.6},{:.6},{},{:.6},{:.2},{:.6},{}",
            result.graph_id,
            result.num_vertices,
            result.num_edges,
            result.target_clusters,
            result.algorithm.as_str(),
            result.execution_mode.as_str(),
            result.run_number,
            result.runtime_sec,
            result.mcmc_runtime_sec,
            result.memory_mb,
            result.nmi,
            result.mdl_raw,
            result.mdl_norm,
            result.clusters_found,
        )
        .map_err(|e| e.to_string())?;
        self.writer.flush().map_err(|e| e.to_string())
    }
}
