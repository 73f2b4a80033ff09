use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Directory scanned for installed applications.
#[cfg(target_os = "macos")]
pub const APPS_DIR: &str = "/Applications";
#[cfg(not(target_os = "macos"))]
pub const APPS_DIR: &str = "/usr/share/applications";

/// Suffix that marks a directory entry as an application.
#[cfg(target_os = "macos")]
pub const APP_SUFFIX: &str = ".app";
#[cfg(not(target_os = "macos"))]
pub const APP_SUFFIX: &str = ".desktop";

/// Display names of the applications installed on this machine.
///
/// Built exactly once at startup by listing a fixed directory, keeping the
/// entries that end in the platform application suffix and stripping it.
/// Directory listing order is preserved as-is; nothing is sorted. There is no
/// refresh: applications installed or removed after startup stay invisible
/// until the next run.
#[derive(Debug)]
pub struct AppCatalog {
    names: Vec<String>,
}

impl AppCatalog {
    /// List `dir` and collect the entries ending in `suffix`, stripped.
    ///
    /// Fails if the directory cannot be listed; there is no fallback catalog.
    pub fn scan(dir: &Path, suffix: &str) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("can't list applications in {}", dir.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("can't read entry in {}", dir.display()))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(stripped) = file_name.strip_suffix(suffix) {
                names.push(stripped.to_string());
            }
        }
        Ok(Self { names })
    }

    /// Scan the platform application directory ([`APPS_DIR`]).
    pub fn scan_default() -> Result<Self> {
        Self::scan(Path::new(APPS_DIR), APP_SUFFIX)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Catalog entries whose name starts with `prefix`, ignoring case.
    ///
    /// Returned in catalog order, so the first hit is the one tab completion
    /// substitutes.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.names
            .iter()
            .filter(|n| n.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::PathBuf;

    fn make_apps_dir(tag: &str, entries: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "openline_catalog_{}_{}",
            std::process::id(),
            tag
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp apps dir");
        for name in entries {
            File::create(dir.join(name)).expect("touch app entry");
        }
        dir
    }

    #[test]
    fn scan_keeps_suffixed_entries_and_strips_suffix() {
        let dir = make_apps_dir("scan", &["Spotify.app", "Preview.app", "notes.txt"]);
        let catalog = AppCatalog::scan(&dir, ".app").unwrap();

        assert_eq!(catalog.names().len(), 2);
        assert!(catalog.contains("Spotify"));
        assert!(catalog.contains("Preview"));
        assert!(!catalog.contains("notes.txt"));
        assert!(!catalog.contains("notes"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn scan_missing_dir_is_an_error() {
        let dir = std::env::temp_dir().join(format!(
            "openline_catalog_{}_missing",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        assert!(AppCatalog::scan(&dir, ".app").is_err());
    }

    #[test]
    fn contains_is_case_sensitive() {
        let catalog = AppCatalog::from_names(vec!["Spotify".to_string()]);
        assert!(catalog.contains("Spotify"));
        assert!(!catalog.contains("spotify"));
        assert!(!catalog.contains("SPOTIFY"));
    }

    #[test]
    fn complete_matches_prefix_ignoring_case() {
        let catalog = AppCatalog::from_names(vec![
            "Spotify".to_string(),
            "Safari".to_string(),
            "Preview".to_string(),
        ]);

        assert_eq!(catalog.complete("s"), vec!["Spotify", "Safari"]);
        assert_eq!(catalog.complete("SPOT"), vec!["Spotify"]);
        assert_eq!(catalog.complete("pre"), vec!["Preview"]);
        assert!(catalog.complete("x").is_empty());
    }

    #[test]
    fn complete_with_empty_prefix_returns_everything_in_order() {
        let catalog = AppCatalog::from_names(vec![
            "Spotify".to_string(),
            "Safari".to_string(),
        ]);
        assert_eq!(catalog.complete(""), vec!["Spotify", "Safari"]);
    }
}
