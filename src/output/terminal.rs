// Colored terminal output for comparison results and the algorithm catalog.
//
// main.rs delegates all human-readable formatting here; `--json` output
// bypasses this module entirely.

use colored::Colorize;
use serde_json::Value;

use crate::compare::{AlgorithmInfo, SimilarityResult};
use crate::semantic::narrative::similarity_label;

/// Longest string detail printed before truncation.
const MAX_DETAIL_CHARS: usize = 160;

/// Display the algorithm catalog.
pub fn display_algorithms(algorithms: &[AlgorithmInfo]) {
    println!(
        "\n{}",
        format!("=== Algorithms ({}) ===", algorithms.len()).bold()
    );
    println!();

    for info in algorithms {
        println!(
            "  {:<20} {:<30} {}",
            info.id.cyan(),
            info.name,
            info.description.dimmed()
        );
    }
    println!();
}

/// Display one comparison result with its details.
pub fn display_result(result: &SimilarityResult) {
    println!("\n{}", format!("=== {} ===", result.algorithm_name).bold());
    println!(
        "  Similarity: {}  ({})",
        colorize_score(result.score),
        similarity_label(result.score)
    );

    let Value::Object(details) = &result.details else {
        return;
    };
    if details.is_empty() {
        return;
    }

    println!("\n  Details:");
    for (key, value) in details {
        match value {
            Value::Array(items) if items.is_empty() => {}
            Value::Array(items) => {
                println!("    {key}:");
                for item in items {
                    println!("      - {}", format_value(item));
                }
            }
            _ => println!("    {:<16} {}", key, format_value(value)),
        }
    }
    println!();
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => super::truncate_chars(s, MAX_DETAIL_CHARS),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_u64() && !n.is_i64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Color a score by the same bands the narrative labels use.
fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{score:.4}");
    if score > 0.8 {
        text.green().bold()
    } else if score > 0.6 {
        text.green()
    } else if score > 0.4 {
        text.yellow()
    } else {
        text.red()
    }
}
