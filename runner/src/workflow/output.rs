use anyhow::Context;
use isrcore::EventReport;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

/// Writes all reports as one pretty-printed JSON array.
pub fn write_reports(path: &Path, reports: &[EventReport]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let file =
        File::create(path).with_context(|| format!("creating report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports)
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

/// Appends the per-window summary lines of each report to a plain-text log.
pub fn append_summary(path: &Path, reports: &[EventReport]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening summary log {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for report in reports {
        writeln!(writer, "# {}", report.dataset)?;
        for line in report.summary_lines() {
            writeln!(writer, "{}", line)?;
        }
    }
    writer.flush()?;
    Ok(())
}
