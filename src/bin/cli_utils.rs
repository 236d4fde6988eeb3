use anyhow::{Context, Result};
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::time::{Duration, Instant};

/// Read a whole input file, or stdin when the path is "-"
pub fn read_input(path: &Path) -> Result<String> {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))
    }
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Live progress display on stderr
///
/// Updates are rate-limited; on a TTY the line is rewritten in place,
/// otherwise each update is printed on its own line.
pub struct ProgressReporter {
    last_update: Instant,
    update_interval: Duration,
    is_tty: bool,
    dirty: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            update_interval: Duration::from_millis(100),
            is_tty: std::io::stderr().is_terminal(),
            dirty: false,
        }
    }

    /// Show a phase update, rate-limited except for the final item
    pub fn show(&mut self, phase: &str, done: usize, total: usize) {
        let now = Instant::now();
        if done < total && now.duration_since(self.last_update) < self.update_interval {
            return;
        }
        self.last_update = now;

        let pct = if total > 0 {
            (done as f64 / total as f64) * 100.0
        } else {
            100.0
        };

        if self.is_tty {
            eprint!(
                "\r\x1b[2K[PROGRESS] {}: {} / {} ({:.0}%)",
                phase,
                format_number(done),
                format_number(total),
                pct
            );
            self.dirty = true;
        } else {
            eprintln!(
                "[PROGRESS] {}: {} / {} ({:.0}%)",
                phase,
                format_number(done),
                format_number(total),
                pct
            );
        }
    }

    /// Move off the rewritten line before normal output resumes
    pub fn finish(&mut self) {
        if self.is_tty && self.dirty {
            eprintln!();
            self.dirty = false;
        }
    }
}
