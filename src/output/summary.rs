//! Human-readable crawl summary
//!
//! Formats the final [`CrawlStats`] for stdout and logs the running totals
//! of an interrupted crawl.

use crate::crawler::Progress;
use crate::stats::CrawlStats;
use std::time::Duration;

/// Formats statistics as a plain text report
pub fn format_statistics(stats: &CrawlStats) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Statistics ===\n\n");

    out.push_str("Overview:\n");
    out.push_str(&format!("  Total URLs crawled: {}\n", stats.total));
    out.push_str(&format!(
        "  Average 200 latency: {}\n",
        format_latency(stats.average_200_latency)
    ));
    out.push_str(&format!(
        "  Max 200 latency: {}\n",
        format_latency(stats.max_200_latency)
    ));
    out.push('\n');

    out.push_str("Status Codes:\n");
    for (status, count) in &stats.status_codes {
        let percentage = if stats.total > 0 {
            (*count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        let label = if *status == 0 {
            "no response".to_string()
        } else {
            status.to_string()
        };
        out.push_str(&format!("  {}: {} ({:.1}%)\n", label, count, percentage));
    }
    out.push('\n');

    if !stats.non_200.is_empty() {
        out.push_str(&format!("Non-200 Responses ({}):\n", stats.non_200.len()));
        for report in &stats.non_200 {
            out.push_str(&format!(
                "  - [{}] {} ({})\n",
                report.status_code,
                report.url,
                format_latency(report.latency)
            ));
            for source in &report.linking_urls {
                out.push_str(&format!("      linked from {}\n", source));
            }
        }
        out.push('\n');
    }

    let success_rate = if stats.total > 0 {
        (stats.count_200() as f64 / stats.total as f64) * 100.0
    } else {
        0.0
    };
    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} URLs returned 200)\n",
        success_rate,
        stats.count_200(),
        stats.total
    ));

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    print!("{}", format_statistics(stats));
}

/// Logs the totals of a crawl in progress
pub fn log_progress(progress: &Progress) {
    tracing::info!(
        "Totals so far ({:?} phase): {} URL(s), {} with status 200, {} other, average 200 latency {}",
        progress.phase,
        progress.stats.total,
        progress.stats.count_200(),
        progress.stats.total - progress.stats.count_200(),
        format_latency(progress.stats.average_200_latency)
    );
}

fn format_latency(latency: Duration) -> String {
    format!("{}ms", latency.as_millis())
}
