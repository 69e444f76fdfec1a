use std::{
    fs::{self, Permissions},
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::types::Changes;

/// Renders a changelog section dated `date`.
///
/// Categories without entries are left out, so an empty [`Changes`] renders
/// just the date heading.
pub fn render_section(changes: &Changes, date: NaiveDate) -> String {
    let mut section = format!("## {}\n\n", date.format("%Y-%m-%d"));

    for (category, entries) in changes.iter() {
        if entries.is_empty() {
            continue;
        }
        section.push_str(category.heading());
        section.push('\n');
        for entry in entries {
            section.push_str(entry.as_str());
            section.push('\n');
        }
        section.push('\n');
    }

    section
}

fn fill_replacement(
    temp: &mut NamedTempFile,
    parts: &[&str],
    permissions: Permissions,
) -> io::Result<()> {
    for part in parts {
        temp.write_all(part.as_bytes())?;
    }
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)
}

/// Prepends `section` to the changelog at `path`.
///
/// The file must already exist. The new content is written to a temporary
/// file beside it and renamed into place, so readers see either the old or
/// the new changelog. A symlinked changelog is resolved first and its target
/// is updated.
pub fn prepend_section(path: &Path, section: &str) -> Result<()> {
    let target = fs::canonicalize(path)
        .with_context(|| format!("Failed to read changelog {}", path.display()))?;
    let existing = fs::read_to_string(&target)
        .with_context(|| format!("Failed to read changelog {}", target.display()))?;
    let permissions = fs::metadata(&target)
        .with_context(|| format!("Failed to stat changelog {}", target.display()))?
        .permissions();

    // Canonical paths are absolute, so a regular file always has a parent.
    let dir = target.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    fill_replacement(&mut temp, &[section, &existing], permissions)
        .with_context(|| format!("Failed to write changelog {}", target.display()))?;

    temp.persist(&target)
        .with_context(|| format!("Failed to replace changelog {}", target.display()))?;

    debug!(
        path = %target.display(),
        added = section.len(),
        previous = existing.len(),
        "Changelog rewritten"
    );
    Ok(())
}
