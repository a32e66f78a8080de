use std::path::{Path, PathBuf};

use ragmd_chunker::Section;
use walkdir::WalkDir;

use crate::error::{LoaderError, Result};
use crate::markdown::{parse_markdown_file, FrontMatter};

/// One parsed markdown file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub sections: Vec<Section>,
    pub front_matter: FrontMatter,
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Find markdown files under `root`.
///
/// A file path yields itself. A directory is walked recursively; results are sorted
/// and capped at `max_files` (`0` means no cap).
pub fn discover_markdown(root: &Path, max_files: usize) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(LoaderError::InvalidPath(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_markdown(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => log::warn!("Failed to read entry: {e}"),
        }
    }
    files.sort();

    if max_files > 0 && files.len() > max_files {
        log::debug!("Capping {} markdown files to {max_files}", files.len());
        files.truncate(max_files);
    }
    log::info!("Found {} markdown files under {}", files.len(), root.display());
    Ok(files)
}

/// Parse one markdown file into a [`LoadedDocument`]
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let (sections, front_matter) = parse_markdown_file(path)?;
    Ok(LoadedDocument {
        path: path.to_path_buf(),
        sections,
        front_matter,
    })
}

/// Lazily parse every markdown file under `root`, in sorted path order
pub fn load_folder(root: &Path) -> Result<impl Iterator<Item = Result<LoadedDocument>>> {
    let files = discover_markdown(root, 0)?;
    Ok(files.into_iter().map(|path| load_document(&path)))
}
