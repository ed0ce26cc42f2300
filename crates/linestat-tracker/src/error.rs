use linestat_diff::DiffError;
use linestat_editor::EditError;
use thiserror::Error;

/// Internal failure of a tracker step. Never surfaces on the edit path: a
/// `TooLarge` diff suppresses tracking, everything else forces a reinstall.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("inconsistent tracker state: {0}")]
    Inconsistent(String),
}
