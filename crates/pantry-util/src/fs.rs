use std::io;
use std::path::{Path, PathBuf};

/// Nearest directory at or above `start` that holds a file named `filename`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(filename).is_file())
        .map(Path::to_path_buf)
}

/// Create `path` and any missing parents. An existing directory is left alone;
/// an existing file at `path` is an error.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Expand a leading `~/` against `home`.
///
/// Paths without the prefix, or a missing home directory, leave the input as is.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
