// Colored terminal output for cluster reports.
//
// Everything here goes to stdout; logging goes to stderr so the report can
// be piped on its own.

use colored::Colorize;

use crate::cluster::VectorizeStats;
use crate::pipeline::report::Report;

/// Longest title shown in a preview line.
const PREVIEW_MAX_CHARS: usize = 80;

/// Display the full clustering report.
pub fn display_report(report: &Report) {
    println!(
        "\n{}",
        format!(
            "=== Title Clusters ({} distinct sentences, k = {}) ===",
            report.sentence_count, report.cluster_count
        )
        .bold()
    );

    if report.empty_removed > 0 || report.duplicates_removed > 0 {
        println!(
            "  {}",
            format!(
                "Skipped {} empty and {} duplicate lines",
                report.empty_removed, report.duplicates_removed
            )
            .dimmed()
        );
    }
    println!(
        "  {}",
        format!(
            "Metric: {}  |  Iterations: {}{}  |  Inertia: {:.4}",
            report.metric,
            report.iterations,
            if report.converged { "" } else { " (cap reached)" },
            report.inertia
        )
        .dimmed()
    );
    if report.tokens > 0 {
        println!(
            "  {}",
            format!(
                "OOV tokens: {}/{} ({:.1}%)",
                report.oov_tokens,
                report.tokens,
                report.oov_tokens as f64 / report.tokens as f64 * 100.0
            )
            .dimmed()
        );
    }

    println!("\n{}", "Mean distance per cluster (worst first):".bold());
    for score in &report.mean_distances {
        let dropped = report.dropped.contains(&score.label);
        let line = format!(
            "  cluster {:>3}  mean distance {:.4}  ({} titles)",
            score.label, score.mean_distance, score.size
        );
        if dropped {
            println!("{}  {}", line.red(), "dropped".red().bold());
        } else {
            println!("{line}");
        }
    }

    for cluster in &report.clusters {
        println!(
            "\n{}",
            format!(
                "cluster {} ({} titles, mean distance {:.4}):",
                cluster.label, cluster.size, cluster.mean_distance
            )
            .bold()
        );
        for entry in &cluster.preview {
            println!(
                "  {:>2}. {} {}",
                entry.rank,
                super::truncate_chars(&entry.text, PREVIEW_MAX_CHARS),
                format!("(distance: {:.4})", entry.distance).dimmed()
            );
        }
        if cluster.size > cluster.preview.len() {
            println!(
                "  {}",
                format!("... {} more", cluster.size - cluster.preview.len()).dimmed()
            );
        }
        println!("  {}", "-".repeat(12).dimmed());
    }
}

/// Display vocabulary coverage of a corpus against an embedding model.
pub fn display_coverage(sentences: usize, stats: &VectorizeStats) {
    println!("\n{}", "=== Embedding Coverage ===".bold());
    println!("  Sentences:        {sentences}");
    println!("  Tokens:           {}", stats.tokens);

    let rate = stats.oov_rate();
    let rate_str = format!("{:.1}%", rate * 100.0);
    let colored_rate = if rate >= 0.5 {
        rate_str.red().bold()
    } else if rate >= 0.2 {
        rate_str.yellow()
    } else {
        rate_str.green()
    };
    println!("  OOV tokens:       {} ({})", stats.oov_tokens, colored_rate);

    if stats.all_oov_sentences > 0 {
        println!(
            "  {} {} sentences have no known tokens and will collapse to the zero vector",
            "!".yellow().bold(),
            stats.all_oov_sentences
        );
    }
}
