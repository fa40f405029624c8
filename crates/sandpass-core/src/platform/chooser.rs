//! Consent prompt seam

use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

/// Appearance of the access prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    /// Panel title. Default: "Allow Access"
    pub title: String,
    /// Panel message. Default templates the application display name.
    pub message: String,
    /// Confirm button label. Default: "Allow"
    pub prompt: String,
}

impl PanelOptions {
    /// Default options with `app_name` templated into the message
    pub fn for_app(app_name: &str) -> Self {
        Self {
            title: "Allow Access".to_string(),
            message: format!(
                "{} needs to access this path to continue. Click Allow to continue.",
                app_name
            ),
            prompt: "Allow".to_string(),
        }
    }
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self::for_app("This App")
    }
}

/// Everything a chooser needs to present one consent prompt
#[derive(Debug, Clone)]
pub struct ChooserRequest {
    pub options: PanelOptions,
    /// Start directory: the nearest ancestor of `target` that exists on disk
    pub directory: PathBuf,
    /// The full path the caller asked for, which may not exist yet
    pub target: PathBuf,
}

/// Modal single-selection directory/file picker.
///
/// Implementations present a panel navigated to `request.directory`, with
/// selection restricted via `SelectionFilter::new(&request.target)` so the
/// user can approve the requested path or an ancestor, but nothing
/// unrelated. `None` means the user cancelled or dismissed the prompt.
#[cfg_attr(test, automock)]
pub trait Chooser {
    fn choose(&self, request: &ChooserRequest) -> Option<PathBuf>;
}

/// Restricts panel selection to the requested path or one of its ancestors,
/// compared component by component.
#[derive(Debug, Clone)]
pub struct SelectionFilter {
    components: Vec<OsString>,
}

impl SelectionFilter {
    pub fn new(target: &Path) -> Self {
        Self {
            components: target
                .components()
                .map(|c| c.as_os_str().to_os_string())
                .collect(),
        }
    }

    /// Whether `candidate` is the requested path itself or an ancestor of it
    pub fn allows(&self, candidate: &Path) -> bool {
        let candidate: Vec<_> = candidate.components().collect();
        if candidate.len() > self.components.len() {
            return false;
        }
        candidate
            .iter()
            .zip(&self.components)
            .all(|(c, t)| c.as_os_str() == t.as_os_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_allows_target_and_ancestors() {
        let filter = SelectionFilter::new(Path::new("/a/b/c/newfile.txt"));

        assert!(filter.allows(Path::new("/a/b/c/newfile.txt")));
        assert!(filter.allows(Path::new("/a/b/c")));
        assert!(filter.allows(Path::new("/a/b")));
        assert!(filter.allows(Path::new("/a")));
        assert!(filter.allows(Path::new("/")));
    }

    #[test]
    fn filter_rejects_siblings_and_deeper_paths() {
        let filter = SelectionFilter::new(Path::new("/a/b/c"));

        assert!(!filter.allows(Path::new("/a/other")));
        assert!(!filter.allows(Path::new("/a/b/other")));
        assert!(!filter.allows(Path::new("/a/b/c/deeper")));
        assert!(!filter.allows(Path::new("/x")));
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = PanelOptions::default();
        assert_eq!(options.title, "Allow Access");
        assert_eq!(options.prompt, "Allow");
        assert!(options.message.starts_with("This App needs to access"));
    }

    #[test]
    fn for_app_templates_the_message() {
        let options = PanelOptions::for_app("Sketchpad");
        assert!(options.message.starts_with("Sketchpad needs to access"));
    }
}
