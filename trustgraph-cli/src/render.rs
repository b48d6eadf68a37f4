//! Plain-text rendering of a path summary.

use std::fmt::Write;

use anyhow::Context;
use trustgraph::{PathSummary, ProfileRow, VerificationStatus};

/// Render the summary for stdout, as JSON or as text.
pub fn render(summary: &PathSummary, json: bool) -> anyhow::Result<String> {
    if json {
        let mut out =
            serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(render_text(summary))
    }
}

/// Render the summary the way a person reads the path: source, the people
/// in between, target.
pub fn render_text(summary: &PathSummary) -> String {
    let mut out = String::new();

    if summary.direct_follow {
        let _ = writeln!(out, "{}", line(&summary.source, "", "follows"));
        let _ = writeln!(out, "{}", line(&summary.target, "", "directly"));
        let _ = writeln!(out);
    }

    let verb = if summary.direct_follow { "also follows" } else { "follows" };
    let _ = writeln!(out, "{}", line(&summary.source, "", verb));
    for row in &summary.intermediaries {
        let _ = writeln!(out, "{}", line(row, "    ", ""));
    }
    let prefix = if summary.intermediaries.is_empty() {
        "no one who follows"
    } else {
        "who all follow"
    };
    let _ = writeln!(out, "{prefix}");
    let _ = writeln!(out, "{}", line(&summary.target, "", ""));

    let _ = writeln!(out);
    if !summary.follows_fetched {
        let _ = writeln!(out, "Unverified: follow-lists have not been pulled from relays.");
    } else if summary.fully_verified {
        let _ = writeln!(out, "Verified: every follow-list on the path checks out.");
    } else {
        let _ = writeln!(out, "Warning: some follow-lists did not add up (see above).");
    }

    out
}

fn line(row: &ProfileRow, indent: &str, suffix: &str) -> String {
    let mut text = format!("{indent}{} ({})", row.label(), row.handle());
    if let Some(following) = row.following {
        let _ = write!(text, " [following {following}]");
    }
    match &row.status {
        Some(VerificationStatus::Verified) => text.push_str(" ✓"),
        Some(VerificationStatus::Contradicted { missing }) => {
            let missing: Vec<String> = missing.iter().map(|k| k.short_npub()).collect();
            let _ = write!(text, " ⚠ missing {}", missing.join(", "));
        }
        Some(VerificationStatus::Unverified) | None => {}
    }
    if !suffix.is_empty() {
        let _ = write!(text, " {suffix}");
    }
    text
}
