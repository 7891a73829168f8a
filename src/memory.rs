use std::fs;

/// Best-effort peak resident set size in MB, read from the kernel's VmHWM
/// accounting. Returns 0 wherever the probe is unavailable; callers treat
/// the value as advisory only.
pub fn peak_memory_mb() -> u64 {
    let status = match fs::read_to_string("/proc/self/status") {
        Ok(content) => content,
        Err(_) => return 0,
    };

    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmHWM:") {
            let kb = rest
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse::<u64>()
                .unwrap_or(0);
            return kb / 1024;
        }
    }

    0
}
