use std::path::{Path, PathBuf};

use tracing::debug;

use super::confirm::OperatorPrompt;
use super::error::PersistError;
use super::run_log::RunLog;

/// Where the operator wants the report written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLocation {
    /// Ask on the console, suggesting a default path.
    Ask { suggested_dir: PathBuf },
    /// Write to this path without asking.
    Fixed(PathBuf),
    /// Do not save the report.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved(PathBuf),
    SavedToFallback(PathBuf),
    Skipped,
}

impl PersistOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            PersistOutcome::Saved(p) | PersistOutcome::SavedToFallback(p) => Some(p),
            PersistOutcome::Skipped => None,
        }
    }
}

/// Opens a saved report for viewing.
pub trait ReportOpener {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

/// Opens with the platform's default handler.
pub struct SystemOpener;

impl ReportOpener for SystemOpener {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        open::that(path)
    }
}

pub struct ReportPersister<'a> {
    location: ReportLocation,
    fallback_dir: PathBuf,
    offer_open: bool,
    opener: &'a dyn ReportOpener,
}

impl<'a> ReportPersister<'a> {
    pub fn new(
        location: ReportLocation,
        fallback_dir: PathBuf,
        offer_open: bool,
        opener: &'a dyn ReportOpener,
    ) -> Self {
        Self {
            location,
            fallback_dir,
            offer_open,
            opener,
        }
    }

    /// Save the document, falling back once to `<fallback_dir>/<file_name>`.
    pub fn save(
        &self,
        document: &str,
        file_name: &str,
        prompt: &mut dyn OperatorPrompt,
        log: &mut RunLog,
    ) -> Result<PersistOutcome, PersistError> {
        let fallback = self.fallback_dir.join(file_name);
        let (target, at_fallback) = match self.choose(file_name, prompt) {
            Ok(Some(path)) => (path, false),
            Ok(None) => {
                log.info("Report save skipped by operator");
                return Ok(PersistOutcome::Skipped);
            }
            Err(e) => {
                log.warning(format!("{}; using fallback location", e));
                (fallback.clone(), true)
            }
        };

        let outcome = match write_report(&target, document) {
            Ok(()) if at_fallback => {
                log.success(format!("Report saved to fallback location {}", target.display()));
                PersistOutcome::SavedToFallback(target)
            }
            Ok(()) => {
                log.success(format!("Report saved to {}", target.display()));
                PersistOutcome::Saved(target)
            }
            // Already at the fallback location: nowhere left to retry.
            Err(e) if at_fallback => {
                log.error(format!("Failed to save report to fallback location: {}", e));
                return Err(e);
            }
            Err(e) => {
                log.warning(format!("{}; trying fallback location", e));
                if let Err(e) = write_report(&fallback, document) {
                    log.error(format!("Failed to save report to fallback location: {}", e));
                    return Err(e);
                }
                log.success(format!("Report saved to fallback location {}", fallback.display()));
                PersistOutcome::SavedToFallback(fallback)
            }
        };

        if self.offer_open {
            if let Some(path) = outcome.path() {
                self.offer_to_open(path, prompt, log);
            }
        }

        Ok(outcome)
    }

    fn choose(
        &self,
        file_name: &str,
        prompt: &mut dyn OperatorPrompt,
    ) -> Result<Option<PathBuf>, PersistError> {
        match &self.location {
            ReportLocation::Fixed(path) => Ok(Some(path.clone())),
            ReportLocation::Skip => Ok(None),
            ReportLocation::Ask { suggested_dir } => {
                let suggested = suggested_dir.join(file_name);
                let question = format!(
                    "Save report to [{}] (enter a path, or 'skip' to cancel):",
                    suggested.display()
                );
                match prompt.ask_line(&question).map_err(PersistError::Chooser)? {
                    None => Ok(None),
                    Some(answer) if answer.eq_ignore_ascii_case("skip") => Ok(None),
                    Some(answer) if answer.is_empty() => Ok(Some(suggested)),
                    Some(answer) => {
                        let path = PathBuf::from(answer);
                        // A directory answer gets the default file name.
                        if path.is_dir() {
                            Ok(Some(path.join(file_name)))
                        } else {
                            Ok(Some(path))
                        }
                    }
                }
            }
        }
    }

    fn offer_to_open(&self, path: &Path, prompt: &mut dyn OperatorPrompt, log: &mut RunLog) {
        match prompt.confirm("Open the report now?") {
            Ok(true) => match self.opener.open(path) {
                Ok(()) => debug!(path = %path.display(), "Opened report"),
                Err(e) => log.warning(format!("Could not open report: {}", e)),
            },
            Ok(false) => {}
            Err(e) => log.warning(format!("Could not ask to open report: {}", e)),
        }
    }
}

fn write_report(path: &Path, document: &str) -> Result<(), PersistError> {
    let to_err = |source: std::io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    std::fs::write(path, document).map_err(to_err)
}
