//! Rendering of the written-files tree and the run summary.

use std::path::{Path, PathBuf};

use colored::Colorize;
use pdfelem::ExtractionResult;

/// Tree of every file the run wrote, relative to the destination.
///
/// ```text
/// ExtractedFiles
/// ├─ Text:
/// │  ├─ text/page0.txt
/// │  └─ text/page1.txt
/// └─ Images:
///    └─ images/img0.png
/// ```
pub fn render_tree(result: &ExtractionResult) -> String {
    let mut lines = vec![format!("{}", "ExtractedFiles".green().bold())];

    push_group(&mut lines, "Text:", &result.text_paths, &result.destination, false);
    push_group(&mut lines, "Images:", &result.image_paths, &result.destination, true);

    lines.join("\n")
}

fn push_group(lines: &mut Vec<String>, title: &str, paths: &[PathBuf], root: &Path, last: bool) {
    let (branch, indent) = if last { ("└─", "   ") } else { ("├─", "│  ") };
    lines.push(format!("{} {}", branch.dimmed(), title.bold()));

    if paths.is_empty() {
        lines.push(format!("{}{} {}", indent.dimmed(), "└─".dimmed(), "(none)".dimmed()));
        return;
    }

    for (i, path) in paths.iter().enumerate() {
        let leaf = if i + 1 == paths.len() { "└─" } else { "├─" };
        let shown = path.strip_prefix(root).unwrap_or(path);
        lines.push(format!("{}{} {}", indent.dimmed(), leaf.dimmed(), shown.display()));
    }
}

/// One-line summary of a finished run.
pub fn summary_line(result: &ExtractionResult) -> String {
    let seconds = (result.finished_at - result.started_at).num_milliseconds() as f64 / 1000.0;
    let mut line = format!(
        "{} {} text files, {} images in {:.2}s",
        "Done!".green().bold(),
        result.text_paths.len(),
        result.image_paths.len(),
        seconds
    );
    if !result.failures.is_empty() {
        line.push_str(&format!(", {}", format!("{} skipped", result.failures.len()).yellow()));
    }
    line
}
