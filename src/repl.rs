use crate::catalog::AppCatalog;
use crate::classify::{Action, Classifier};
use crate::launcher::{LaunchPlan, Launcher};
use crate::telemetry;
use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use std::sync::Arc;

/// Fixed prompt shown before every line.
pub const PROMPT: &str = "What would you like to open (website, application, file, or folder)? ";

const EXIT_MESSAGE: &str = "Exiting program...";

const HELP_TEXT: &str = "
Available Commands:
1. Open a website: Type a full URL or a domain name (e.g., 'https://example.com' or 'example.com').
2. Open an application: Type the name of the application (e.g., 'Spotify').
3. Open a file or folder: Type the path to the file or folder (e.g., '/path/to/myFile.txt').
4. Open a file with a specific application: Type 'open filename with ApplicationName' (e.g., 'open myImage.png with Preview').
5. View system information: Type 'sys info' to display current CPU usage, RAM usage, and network speed.
6. Help: Type 'help' or '?' to display this help message.
7. Exit: Type 'exit' to close the program.
";

/// Tab completion backed by the application catalog.
///
/// Matching catalog entries replace the typed prefix, first match first, with
/// a trailing space so the user can keep typing. When nothing matches, the
/// whole catalog is offered as suggestions and the line is left untouched.
struct CatalogHelper {
    catalog: Arc<AppCatalog>,
}

impl Completer for CatalogHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        let hits = self.catalog.complete(typed);
        if hits.is_empty() {
            let fallback = self
                .catalog
                .names()
                .iter()
                .map(|name| Pair {
                    display: name.clone(),
                    replacement: typed.to_string(),
                })
                .collect();
            return Ok((0, fallback));
        }
        let candidates = hits
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: format!("{name} "),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for CatalogHelper {
    type Hint = String;
}

impl Highlighter for CatalogHelper {}
impl Validator for CatalogHelper {}
impl Helper for CatalogHelper {}

/// The interactive loop: prompt, classify, dispatch, repeat.
pub struct Repl {
    editor: Editor<CatalogHelper, DefaultHistory>,
    classifier: Classifier,
    launcher: Launcher,
    http: reqwest::Client,
}

impl Repl {
    pub fn new(catalog: Arc<AppCatalog>) -> Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::Circular)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CatalogHelper {
            catalog: catalog.clone(),
        }));
        Ok(Self {
            editor,
            classifier: Classifier::new(catalog)?,
            launcher: Launcher,
            http: reqwest::Client::new(),
        })
    }

    /// Run until `exit`, Ctrl-C or Ctrl-D; always prints the exit message.
    ///
    /// Launched children are not waited for or killed on the way out; their
    /// lifecycle logs may simply never arrive.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            // The editor blocks the thread; block_in_place keeps the runtime
            // free to drive detached child waits meanwhile.
            let readline = tokio::task::block_in_place(|| self.editor.readline(PROMPT));
            match readline {
                Ok(line) => {
                    self.editor.add_history_entry(line.as_str())?;
                    if !self.dispatch(&line).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        println!("{EXIT_MESSAGE}");
        Ok(())
    }

    /// Returns `false` when the loop should terminate.
    ///
    /// Every error path prints a message naming the offending input and keeps
    /// the loop alive; nothing here is fatal.
    async fn dispatch(&self, line: &str) -> bool {
        match self.classifier.classify(line) {
            Action::Exit => return false,
            Action::Help => println!("{HELP_TEXT}"),
            Action::SysInfo => println!("{}", telemetry::report(&self.http).await),
            Action::OpenWith { path, app } => {
                self.launcher.launch(LaunchPlan::path_with_app(&path, &app));
            }
            Action::OpenUrl(url) => self.launcher.launch(LaunchPlan::url(&url)),
            Action::OpenPath(path) => self.launcher.launch(LaunchPlan::path(&path)),
            Action::OpenApp(app) => self.launcher.launch(LaunchPlan::app(&app)),
            Action::MissingFile(file) => {
                eprintln!("Error: The file \"{file}\" does not exist.");
            }
            Action::UnknownTarget(app) => {
                eprintln!("Error: The application \"{app}\" is not found.");
            }
            Action::Empty => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper_with(names: &[&str]) -> CatalogHelper {
        let catalog = AppCatalog::from_names(names.iter().map(|s| s.to_string()).collect());
        CatalogHelper {
            catalog: Arc::new(catalog),
        }
    }

    fn complete(helper: &CatalogHelper, line: &str) -> (usize, Vec<Pair>) {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        helper.complete(line, line.len(), &ctx).unwrap()
    }

    #[test]
    fn matching_prefix_substitutes_first_hit_with_trailing_space() {
        let helper = helper_with(&["Spotify", "Safari"]);
        let (start, candidates) = complete(&helper, "spo");
        assert_eq!(start, 0);
        assert_eq!(candidates[0].replacement, "Spotify ");
    }

    #[test]
    fn no_match_offers_the_full_catalog_without_changing_the_line() {
        let helper = helper_with(&["Spotify", "Safari"]);
        let (_, candidates) = complete(&helper, "xyz");
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|pair| pair.replacement == "xyz"));
    }

    #[test]
    fn completion_is_case_insensitive_and_order_preserving() {
        let helper = helper_with(&["Spotify", "Safari", "Preview"]);
        let (_, candidates) = complete(&helper, "S");
        let names: Vec<&str> = candidates.iter().map(|p| p.display.as_str()).collect();
        assert_eq!(names, vec!["Spotify", "Safari"]);
    }

    #[test]
    fn help_text_names_every_command_category() {
        for needle in ["website", "application", "file or folder", "sys info", "help", "exit"] {
            assert!(HELP_TEXT.contains(needle), "help text misses {needle}");
        }
    }
}
