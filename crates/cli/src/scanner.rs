use ignore::{DirEntry, WalkBuilder};
use repolens_extractor::Language;
use std::path::{Path, PathBuf};

/// Directory names pruned from every walk, on top of .gitignore rules
const PRUNED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".repolens",
    ".idea",
    ".vscode",
    ".cache",
    "node_modules",
    "build",
    "dist",
    "coverage",
    "target",
    ".venv",
    "__pycache__",
    "vendor",
    "third_party",
    "third-party",
];

/// Files above this size are generated artifacts, not source
const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

/// Non-code extensions still worth ingesting; they get module assignment
/// and file chunks but no symbols
const DOC_EXTENSIONS: &[&str] = &["md"];

/// Finds the files to analyze under a repository root (.gitignore aware).
///
/// This is the stand-in for the ingest collaborator: it produces the
/// finalized file list with language tags that the pipeline consumes.
pub struct RepoScanner {
    root: PathBuf,
}

impl RepoScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Scan for analyzable files, returned sorted by relative path
    pub fn scan(&self) -> Vec<PathBuf> {
        let root = self.root.clone();
        let mut walk = WalkBuilder::new(&self.root);
        walk.hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(move |entry| !in_pruned_scope(entry.path(), &root));

        let mut files: Vec<PathBuf> = walk
            .build()
            .filter_map(|walked| match walked {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(within_size_cap)
            .map(DirEntry::into_path)
            .filter(|path| is_analyzable(path))
            .collect();

        files.sort();
        log::info!("found {} analyzable files", files.len());
        files
    }
}

fn within_size_cap(entry: &DirEntry) -> bool {
    match entry.metadata() {
        Ok(meta) if meta.len() > MAX_FILE_SIZE_BYTES => {
            log::debug!(
                "skipping large file {} ({} bytes)",
                entry.path().display(),
                meta.len()
            );
            false
        }
        _ => true,
    }
}

fn is_analyzable(path: &Path) -> bool {
    if Language::from_path(path) != Language::Unknown {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn in_pruned_scope(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| {
        matches!(
            component,
            std::path::Component::Normal(name)
                if PRUNED_DIRS.contains(&name.to_string_lossy().to_lowercase().as_str())
        )
    })
}

#[cfg(test)]
mod tests {
    use super::RepoScanner;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_source_files_sorted() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("zeta.py"), b"x = 1\n").unwrap();
        fs::write(temp.path().join("alpha.rs"), b"fn main() {}\n").unwrap();
        fs::write(temp.path().join("notes.md"), b"# notes\n").unwrap();
        fs::write(temp.path().join("binary.dat"), b"\x00\x01").unwrap();

        let files = RepoScanner::new(temp.path()).scan();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["alpha.rs", "notes.md", "zeta.py"]);
    }

    #[test]
    fn skips_pruned_directories() {
        let temp = tempdir().unwrap();
        let vendored = temp.path().join("node_modules").join("pkg");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(vendored.join("index.js"), b"x").unwrap();
        fs::write(temp.path().join("app.js"), b"x").unwrap();

        let files = RepoScanner::new(temp.path()).scan();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app.js"));
    }

    #[test]
    fn respects_gitignore() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".gitignore"), b"generated.py\n").unwrap();
        fs::write(temp.path().join("generated.py"), b"x = 1\n").unwrap();
        fs::write(temp.path().join("kept.py"), b"x = 1\n").unwrap();

        let files = RepoScanner::new(temp.path()).scan();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("kept.py"));
    }
}
