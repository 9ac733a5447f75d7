//! Human-readable text output

use crate::output::summary::RunSummary;
use std::time::Duration;

/// Print run results to the console
///
/// Displays:
/// - Request totals by operation kind
/// - Secondary metrics (retransmissions, cache hits, primary contacts)
/// - Latency statistics per kind
/// - Audit counters for data that did not reach a latency bucket
pub fn print_results(summary: &RunSummary, elapsed: Duration) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    ANALYSIS RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    println!("Elapsed Time: {:.3}s", elapsed.as_secs_f64());
    println!("Hosts:        {}", summary.hosts);
    println!();

    println!("Requests:");
    for counts in &summary.kinds {
        if counts.successes + counts.failures == 0 {
            continue;
        }
        println!(
            "  {:<12} {} ok, {} failed",
            format!("{}:", counts.kind),
            format_number(counts.successes),
            format_number(counts.failures)
        );
    }
    println!(
        "  {:<12} {} ok, {} failed",
        "Total:",
        format_number(summary.successes),
        format_number(summary.failures)
    );
    println!();

    println!("Secondary:");
    println!(
        "  Retransmissions: {} ({:.2}% of lookups)",
        format_number(summary.retransmissions),
        summary.retransmission_rate * 100.0
    );
    println!(
        "  Cache hits:      {} ({:.2}% of lookups)",
        format_number(summary.cache_hits),
        summary.cache_hit_rate * 100.0
    );
    println!(
        "  Primary contact: {} ({:.2}% of successes)",
        format_number(summary.primary_contacts),
        summary.primary_contact_rate * 100.0
    );
    if summary.fairness_index >= 0.0 {
        println!("  Fairness index:  {:.3}", summary.fairness_index);
    }
    println!();

    println!("Latency (ms):");
    if summary.latency.is_empty() {
        println!("  No latency data collected");
    }
    for group in &summary.latency {
        let s = &group.summary;
        println!(
            "  {:<13} n={:<9} min {:.3}  median {:.3}  mean {:.3}  max {:.3}",
            group.kind,
            s.count,
            s.min,
            s.median,
            s.mean,
            s.max
        );
        if !s.percentiles.is_empty() {
            let line: Vec<String> = s
                .percentiles
                .iter()
                .map(|(p, v)| format!("p{}: {:.3}", p, v))
                .collect();
            println!("  {:<13} {}", "", line.join("  "));
        }
    }
    println!();

    let audit = &summary.audit;
    println!("Audit:");
    println!("  Shards read:        {}", format_number(audit.shards_read));
    println!("  Shard errors:       {}", format_number(audit.shard_errors));
    println!("  Parse errors:       {}", format_number(audit.parse_errors));
    println!("  Unrecognized lines: {}", format_number(audit.unrecognized_lines));
    println!("  Excluded events:    {}", format_number(audit.excluded_events));
    println!("  Unanchored events:  {}", format_number(audit.unanchored_events));
    println!();

    println!("═══════════════════════════════════════════════════════════");
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
