use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use arlo_logging::arlo_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::sheets::SheetDocument;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("output directory unusable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Creates `dir` if missing and checks that it is a writable directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ExportError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
    } else if !dir.is_dir() {
        return Err(ExportError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    NamedTempFile::new_in(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes `contents` to `{dir}/{file_name}` through a temp file in the same
/// directory, so readers never see a partial file.
pub fn write_atomic(dir: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf, ExportError> {
    ensure_output_dir(dir)?;
    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
    Ok(target)
}

/// File name for a sheet: its title made safe for any filesystem, plus `.json`.
pub fn sheet_file_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    let mut last_was_underscore = false;
    for c in title.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && last_was_underscore {
            continue;
        }
        last_was_underscore = c == '_';
        name.push(c);
    }
    let mut name = name.trim_matches(&['_', ' ', '.'][..]).to_string();
    if name.is_empty() {
        name = "sheet".to_string();
    }
    if name.chars().count() > 120 {
        name = name.chars().take(120).collect();
    }
    format!("{name}.json")
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

/// Serializes `doc` as pretty JSON into `dir`, named after its title.
pub fn write_sheet(dir: &Path, doc: &SheetDocument) -> Result<PathBuf, ExportError> {
    let json = serde_json::to_vec_pretty(doc)?;
    let path = write_atomic(dir, &sheet_file_name(&doc.title), &json)?;
    arlo_info!(
        "wrote {} ({} pages) to {}",
        doc.title,
        doc.pages.len(),
        path.display()
    );
    Ok(path)
}
