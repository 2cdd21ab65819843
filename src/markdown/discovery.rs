use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Walk `root` and return every `.md` file, sorted, skipping directories
/// whose name appears in `skip_dirs`.
pub fn discover_markdown(root: &Path, skip_dirs: &[String]) -> Vec<PathBuf> {
    discover_files(root, skip_dirs, |path| {
        path.extension().and_then(|ext| ext.to_str()) == Some("md")
    })
}

/// Walk `root` and return files accepted by `keep`, in sorted order.
pub fn discover_files(
    root: &Path,
    skip_dirs: &[String],
    keep: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !should_skip(e, skip_dirs));

    let mut matches = Vec::new();
    for entry in walker.filter_map(Result::ok) {
        if entry.file_type().is_file() && keep(entry.path()) {
            matches.push(entry.into_path());
        }
    }
    matches
}

/// Display form of `path` relative to `root`, falling back to the full path.
pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn should_skip(entry: &walkdir::DirEntry, skip_dirs: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_str().unwrap_or_default();
    skip_dirs.iter().any(|d| d == name)
}
