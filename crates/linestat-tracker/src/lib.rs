// linestat-tracker: keeps a document's change ranges against its base
// revision current, one dirty window at a time.

mod dirty;
mod error;
mod markers;
mod settings;
mod tracker;

pub use dirty::DirtyRange;
pub use error::TrackerError;
pub use settings::TrackerSettings;
pub use tracker::{Collaborators, LineStatusTracker, TransferDirection};
