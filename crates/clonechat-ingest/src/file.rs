//! Source file discovery and text extraction.

use std::path::{Path, PathBuf};

use clonechat_core::Result;

/// Supported file types for text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Markdown,
    Json,
    Unsupported,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "txt" | "text" => Self::PlainText,
            "md" | "markdown" | "mdx" => Self::Markdown,
            "json" => Self::Json,
            _ => Self::Unsupported,
        }
    }
}

/// Extract text from a file. `None` for unsupported types.
pub fn extract_text(path: &Path) -> Result<Option<String>> {
    match FileType::from_path(path) {
        FileType::PlainText | FileType::Markdown => Ok(Some(std::fs::read_to_string(path)?)),
        FileType::Json => extract_json(path).map(Some),
        FileType::Unsupported => Ok(None),
    }
}

/// JSON sources are either an array of strings (one note each, joined by
/// blank lines) or any other document, which is indexed as raw text.
fn extract_json(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    if let Ok(notes) = serde_json::from_str::<Vec<String>>(&content) {
        return Ok(notes.join("\n\n"));
    }
    Ok(content)
}

/// All supported files under `dir`, recursively, in a stable order.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    visit(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn visit(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            visit(&path, files)?;
        } else if file_type.is_file() && FileType::from_path(&path) != FileType::Unsupported {
            files.push(path);
        }
    }
    Ok(())
}
