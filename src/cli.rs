use std::path::PathBuf;

use crate::config::Config;
use crate::parser::GeneratorKind;

const USAGE: &str = "Usage: minisbm config_csv results_csv [options]";

fn parse_usize(s: &str) -> Option<usize> {
    s.parse::<usize>().ok()
}

fn parse_u64(s: &str) -> Option<u64> {
    s.parse::<u64>().ok()
}

pub fn parse_args(args: &[String]) -> Result<Config, String> {
    let raw_args = args.join(" ");

    let mut config_file: Option<PathBuf> = None;
    let mut results_file: Option<PathBuf> = None;

    let mut generator = GeneratorKind::Standard;
    let mut runs = 5usize;
    let mut proposals_per_split = 50usize;
    let mut seed: Option<u64> = None;
    let mut worker_threads: Option<usize> = None;
    let mut sequential_only = false;
    let mut parallel_only = false;
    let mut silent = false;

    let mut i = 0usize;
    while i < args.len() {
        let tok = &args[i];

        if let Some(rest) = tok.strip_prefix("--runs=") {
            if let Some(v) = parse_usize(rest) {
                runs = v.max(1);
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--proposals=") {
            if let Some(v) = parse_usize(rest) {
                proposals_per_split = v.max(1);
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--seed=") {
            if let Some(v) = parse_u64(rest) {
                seed = Some(v);
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--threads=") {
            if let Some(v) = parse_usize(rest) {
                if v > 0 {
                    worker_threads = Some(v);
                }
            }
            i += 1;
            continue;
        }

        match tok.as_str() {
            "--lfr" => {
                generator = GeneratorKind::Lfr;
                i += 1;
            }
            "--standard" => {
                generator = GeneratorKind::Standard;
                i += 1;
            }
            "--runs" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_usize(next) {
                        runs = v.max(1);
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--proposals" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_usize(next) {
                        proposals_per_split = v.max(1);
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--seed" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_u64(next) {
                        seed = Some(v);
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--threads" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_usize(next) {
                        if v > 0 {
                            worker_threads = Some(v);
                        }
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--sequential" => {
                sequential_only = true;
                i += 1;
            }
            "--parallel" => {
                parallel_only = true;
                i += 1;
            }
            "--silent" => {
                silent = true;
                i += 1;
            }
            _ if tok.starts_with('-') => {
                i += 1;
            }
            _ => {
                if config_file.is_none() {
                    config_file = Some(PathBuf::from(tok));
                } else if results_file.is_none() {
                    results_file = Some(PathBuf::from(tok));
                }
                i += 1;
            }
        }
    }

    let config_file = config_file.ok_or_else(|| USAGE.to_string())?;
    let results_file = results_file.ok_or_else(|| USAGE.to_string())?;

    if sequential_only && parallel_only {
        return Err("--sequential and --parallel are mutually exclusive".to_string());
    }

    Ok(Config {
        raw_args,
        config_file,
        results_file,
        generator,
        runs,
        proposals_per_split,
        seed,
        worker_threads,
        sequential_only,
        parallel_only,
        silent,
    })
}
