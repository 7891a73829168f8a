use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::generator::LfrConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Standard,
    Lfr,
}

#[derive(Debug, Clone, Copy)]
pub enum GraphConfig {
    Standard {
        n: usize,
        k: usize,
        p_in: f64,
        p_out: f64,
    },
    Lfr(LfrConfig),
}

fn parse_standard_row(line: &str) -> Option<GraphConfig> {
    let mut cells = line.split(',');
    let n = cells.next()?.trim().parse::<usize>().ok()?;
    let k = cells.next()?.trim().parse::<usize>().ok()?;
    let p_in = cells.next()?.trim().parse::<f64>().ok()?;
    let p_out = cells.next()?.trim().parse::<f64>().ok()?;
    Some(GraphConfig::Standard { n, k, p_in, p_out })
}

fn parse_lfr_row(line: &str) -> Option<GraphConfig> {
    let mut cells = line.split(',');
    let n = cells.next()?.trim().parse::<usize>().ok()?;
    let tau1 = cells.next()?.trim().parse::<f64>().ok()?;
    let tau2 = cells.next()?.trim().parse::<f64>().ok()?;
    let mu = cells.next()?.trim().parse::<f64>().ok()?;
    let avg_degree = cells.next()?.trim().parse::<usize>().ok()?;
    let min_comm_size = cells.next()?.trim().parse::<usize>().ok()?;
    Some(GraphConfig::Lfr(LfrConfig {
        n,
        tau1,
        tau2,
        mu,
        avg_degree,
        min_comm_size,
    }))
}

/// Read graph configurations from a CSV: first row is a header, blank lines
/// are ignored and rows with malformed numeric cells are skipped silently.
pub fn parse_config_file(path: &Path, kind: GeneratorKind) -> Result<Vec<GraphConfig>, String> {
    let file = File::open(path).map_err(|e| {
        format!(
            "Could not open the configuration file '{}': {}",
            path.display(),
            e
        )
    })?;
    let reader = BufReader::new(file);

    let mut configs = Vec::new();
    for (index, line_res) in reader.lines().enumerate() {
        let line =
            line_res.map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
        if index == 0 {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = match kind {
            GeneratorKind::Standard => parse_standard_row(line),
            GeneratorKind::Lfr => parse_lfr_row(line),
        };
        if let Some(config) = parsed {
            configs.push(config);
        }
    }

    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn standard_rows_are_parsed() {
        let file = write_config("n,k,p_in,p_out\n100,4,0.2,0.02\n50,2,0.5,0.1\n");
        let configs = parse_config_file(file.path(), GeneratorKind::Standard).unwrap();
        assert_eq!(configs.len(), 2);
        match configs[0] {
            GraphConfig::Standard { n, k, p_in, p_out } => {
                assert_eq!((n, k), (100, 4));
                assert!((p_in - 0.2).abs() < 1e-12);
                assert!((p_out - 0.02).abs() < 1e-12);
            }
            _ => panic!("expected a standard row"),
        }
    }

    #[test]
    fn blank_and_malformed_rows_are_skipped() {
        let file = write_config("n,k,p_in,p_out\n\n100,four,0.2,0.02\n\n60,3,0.4,0.05\n");
        let configs = parse_config_file(file.path(), GeneratorKind::Standard).unwrap();
        assert_eq!(configs.len(), 1);
    }

    #[test]
    fn lfr_rows_need_all_six_cells() {
        let file = write_config("n,tau1,tau2,mu,avg_degree,min_comm_size\n200,2.5,1.8,0.1,10,20\n200,2.5,1.8,0.1,10\n");
        let configs = parse_config_file(file.path(), GeneratorKind::Lfr).unwrap();
        assert_eq!(configs.len(), 1);
        match configs[0] {
            GraphConfig::Lfr(cfg) => {
                assert_eq!(cfg.n, 200);
                assert_eq!(cfg.min_comm_size, 20);
            }
            _ => panic!("expected an LFR row"),
        }
    }

    #[test]
    fn header_only_file_yields_no_configs() {
        let file = write_config("n,k,p_in,p_out\n");
        let configs = parse_config_file(file.path(), GeneratorKind::Standard).unwrap();
        assert!(configs.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = Path::new("/definitely/not/here.csv");
        assert!(parse_config_file(path, GeneratorKind::Standard).is_err());
    }
}
