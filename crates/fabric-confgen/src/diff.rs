//! Whole-line configuration diffing.
//!
//! Treats both configurations as unordered line sets and emits the
//! commands that transform current into desired: lines only in current
//! become `no <line>`, lines only in desired are emitted as-is. Blank
//! lines and `!` separators are ignored. This is deliberately coarse;
//! it does not understand stanza nesting.

use std::collections::BTreeSet;

/// Computes the commands needed to transform `current` into `desired`.
pub fn diff_configs(current: &str, desired: &str) -> Vec<String> {
    let current_lines: BTreeSet<&str> = current.trim().lines().collect();
    let desired_lines: BTreeSet<&str> = desired.trim().lines().collect();

    let mut commands = Vec::new();

    for line in current_lines.difference(&desired_lines) {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('!') {
            commands.push(format!("no {}", line));
        }
    }

    for line in desired_lines.difference(&current_lines) {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('!') {
            commands.push(line.to_string());
        }
    }

    commands
}
