use crate::catalog::AppCatalog;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the shell should do with one line of input.
#[derive(Debug, PartialEq)]
pub enum Action {
    /// Terminate the interactive loop.
    Exit,
    /// Print the static help text.
    Help,
    /// Collect and print a telemetry snapshot.
    SysInfo,
    /// Open `path` with the named application instead of the default handler.
    OpenWith { path: PathBuf, app: String },
    /// Open a URL with the default handler.
    OpenUrl(String),
    /// Open an existing file or folder with the default handler.
    OpenPath(PathBuf),
    /// Launch an application from the catalog by display name.
    OpenApp(String),
    /// `open .. with ..` named a file that does not exist; carries the file
    /// as the user typed it.
    MissingFile(String),
    /// Input resolved to neither a path nor a known application; carries the
    /// capitalized form that was looked up.
    UnknownTarget(String),
    /// Blank line; nothing to do.
    Empty,
}

/// Ordered decision list mapping raw input text to an [`Action`].
///
/// The rules are tried strictly in order and the first match wins. Inputs can
/// match several rules (a path can end in a dot-extension and look like a
/// domain), so the ordering is part of the contract, not an implementation
/// detail.
pub struct Classifier {
    catalog: Arc<AppCatalog>,
    open_with: Regex,
    domain: Regex,
}

impl Classifier {
    pub fn new(catalog: Arc<AppCatalog>) -> Result<Self> {
        Ok(Self {
            catalog,
            // Greedy first group: the split lands on the last " with ".
            open_with: Regex::new(r"open (.+) with (.+)")
                .context("can't compile the open-with pattern")?,
            domain: Regex::new(r"\.\w+$").context("can't compile the domain pattern")?,
        })
    }

    /// Classify one line of input.
    ///
    /// Never fails: unresolvable targets come back as [`Action::MissingFile`]
    /// or [`Action::UnknownTarget`] for the caller to report.
    pub fn classify(&self, input: &str) -> Action {
        let command = input.trim();

        if command.is_empty() {
            return Action::Empty;
        }
        if command.eq_ignore_ascii_case("exit") {
            return Action::Exit;
        }
        if command.eq_ignore_ascii_case("help") || command == "?" {
            return Action::Help;
        }
        if command.eq_ignore_ascii_case("sys info") {
            return Action::SysInfo;
        }

        if let Some(caps) = self.open_with.captures(command) {
            let file = caps[1].trim();
            let app = caps[2].trim();
            let path = resolve(Path::new(file));
            return if path.exists() {
                Action::OpenWith {
                    path,
                    app: app.to_string(),
                }
            } else {
                Action::MissingFile(file.to_string())
            };
        }

        if command.starts_with("http://") || command.starts_with("https://") {
            return Action::OpenUrl(command.to_string());
        }

        if self.domain.is_match(command) && !command.contains(char::is_whitespace) {
            return Action::OpenUrl(format!("https://{command}"));
        }

        let path = resolve(Path::new(command));
        if path.exists() {
            return Action::OpenPath(path);
        }

        let app = capitalize(command);
        if self.catalog.contains(&app) {
            Action::OpenApp(app)
        } else {
            Action::UnknownTarget(app)
        }
    }
}

/// Resolve a user-supplied path against the current directory without
/// requiring it to exist and without touching symlinks.
fn resolve(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Uppercase the first character, leave the rest untouched.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
