// Output for a finished run: the bracket as plain text or as JSON.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write;

use crate::selector::BracketPicks;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable bracket
    #[default]
    Text,
    /// The picks and any selection issues as JSON
    Json,
}

pub fn render(picks: &BracketPicks, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(picks)),
        OutputFormat::Json => serde_json::to_string_pretty(picks),
    }
}

fn joined(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub fn render_text(picks: &BracketPicks) -> String {
    let mut out = String::new();
    out.push_str("\n=== March Madness Bracket ===\n");

    let sections = [
        ("Finals", &picks.finals),
        ("Final Four", &picks.final_four),
        ("Elite Eight", &picks.elite_eight),
        ("Sweet Sixteen", &picks.sweet_sixteen),
        ("Round of 32", &picks.round_of_32),
    ];
    // Writing to a String cannot fail
    let _ = write!(
        out,
        "\n Champion:\n{}\n",
        picks.champion.as_deref().unwrap_or("(none)")
    );
    for (title, set) in sections {
        let _ = write!(out, "\n {}:\n{}\n", title, joined(set));
    }

    if !picks.issues.is_empty() {
        out.push_str("\n Notes:\n");
        for issue in &picks.issues {
            let _ = writeln!(out, "- {}", issue);
        }
    }
    out
}
