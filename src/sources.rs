//! Reading source documents from the filesystem.

use crate::types::{AppError, Document, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions read when the caller does not pass a filter.
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

/// Recursively read every matching file under `root` into documents.
///
/// Files are visited in sorted path order, so indexing the same directory
/// twice produces the same document sequence. `extensions` are matched
/// case-insensitively without the leading dot; `None` means the default
/// `.txt`/`.md`/`.pdf` set. A text file becomes one document; a PDF becomes
/// one document per non-empty page, with the 1-based page number in its
/// metadata. A file that cannot be read is skipped with a warning; only a
/// missing or unreadable `root` itself is fatal.
pub fn read_dir(root: &Path, extensions: Option<&[String]>) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let default: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect();
    let extensions: Vec<String> = extensions
        .unwrap_or(&default)
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut files = Vec::new();
    collect_files(root, &extensions, &mut files)?;
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        if matches_extension(&path, &["pdf".to_string()]) {
            match read_pdf(&path) {
                Ok(mut pages) => {
                    debug!(path = %path.display(), pages = pages.len(), "Read PDF");
                    documents.append(&mut pages);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable PDF");
                }
            }
        } else {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    debug!(path = %path.display(), chars = text.chars().count(), "Read document");
                    documents.push(Document::new(text, path.display().to_string()));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                }
            }
        }
    }
    Ok(documents)
}

/// Extract a PDF into one document per page, skipping blank pages.
///
/// Page numbers are 1-based, matching how readers cite them.
fn read_pdf(path: &Path) -> Result<Vec<Document>> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
        AppError::InvalidInput(format!(
            "cannot extract text from {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| {
            Document::new(text, path.display().to_string()).with_page(i as u32 + 1)
        })
        .collect())
}

fn collect_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            if let Err(e) = collect_files(&path, extensions, out) {
                warn!(dir = %path.display(), error = %e, "Skipping unreadable directory");
            }
        } else if matches_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
