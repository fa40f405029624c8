//! Path normalization and ancestor resolution

use std::path::{Component, Path, PathBuf};

/// Normalize a target to an absolute, symlink-stable representation.
///
/// The longest existing prefix is canonicalized so the key a grant is stored
/// under matches the path a chooser returns later (`/tmp` is a symlink to
/// `/private/tmp` on macOS); the non-existing remainder is cleaned lexically.
pub fn normalize(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    let absolute = if expanded.is_relative() {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&expanded),
            Err(_) => expanded,
        }
    } else {
        expanded
    };
    let absolute = clean(&absolute);

    if let Ok(canonical) = absolute.canonicalize() {
        return canonical;
    }

    // Canonicalize the nearest existing ancestor and re-append the rest
    let mut base = absolute;
    let mut remainder = Vec::new();
    while !base.exists() {
        let Some(parent) = base.parent() else { break };
        if let Some(name) = base.file_name() {
            remainder.push(name.to_os_string());
        }
        base = parent.to_path_buf();
    }

    let mut result = base.canonicalize().unwrap_or(base);
    for part in remainder.into_iter().rev() {
        result.push(part);
    }
    result
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Lexically remove `.` and `..` components without touching the filesystem
fn clean(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }
    components.iter().collect()
}

/// Walk upward from `path` until a file or directory that exists on disk is
/// found.
///
/// Writing a new file needs permission on its containing directory, so the
/// consent prompt is scoped there rather than at the not-yet-created path.
pub fn existing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors().find(|p| p.exists()).map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_canonicalizes_existing_paths() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(normalize(dir.path()), canonical);
    }

    #[test]
    fn normalize_reconstructs_nonexistent_tails() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();

        let target = dir.path().join("not/yet/created.txt");
        assert_eq!(normalize(&target), canonical.join("not/yet/created.txt"));
    }

    #[test]
    fn normalize_cleans_dot_segments() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();

        let target = dir.path().join("a/./b/../c/file.txt");
        assert_eq!(normalize(&target), canonical.join("a/c/file.txt"));
    }

    #[test]
    fn existing_ancestor_stops_at_first_real_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let target = nested.join("c/newfile.txt");
        assert_eq!(existing_ancestor(&target).unwrap(), nested);
    }

    #[test]
    fn existing_ancestor_of_an_existing_path_is_itself() {
        let dir = tempdir().unwrap();
        assert_eq!(existing_ancestor(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn existing_ancestor_fails_for_unrooted_garbage() {
        assert!(existing_ancestor(Path::new("no/such/relative/path/here")).is_none());
    }
}
