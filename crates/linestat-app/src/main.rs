// linestat: track a working file against its base revision and print the
// changed line ranges. Exit status is 0 when unchanged, 1 when the files
// differ, 2 on error.

mod cli;
mod report;
mod settings;

use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use linestat_editor::{split_lines, Document};
use linestat_index::CompressedIndex;
use linestat_tracker::{Collaborators, LineStatusTracker, TrackerSettings};

use cli::{Options, Rollback};

// ──────────────────────────────────────────────
// Session
// ──────────────────────────────────────────────

/// A document opened at the base text and tracked against it.
struct Session {
    doc: Document,
    tracker: Arc<LineStatusTracker>,
}

impl Session {
    fn open(path: &Path, base: &str, settings: TrackerSettings) -> Self {
        let collaborators = Collaborators::new(&settings);
        let mut doc = Document::from_text(base);
        let tracker = LineStatusTracker::attach(&mut doc, path, settings, collaborators);
        tracker.set_base_revision(&doc, base);
        Self { doc, tracker }
    }

    /// Bring the document to `text` with one edit over the lines that differ.
    fn replay(&mut self, text: &str) -> io::Result<()> {
        let target = split_lines(text);
        let lines = self.doc.lines();
        let prefix = lines.iter().zip(&target).take_while(|(a, b)| a == b).count();
        let max_suffix = lines.len().min(target.len()) - prefix;
        let suffix = lines[prefix..]
            .iter()
            .rev()
            .zip(target[prefix..].iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let line2 = lines.len() - suffix;
        log::debug!("replaying lines {}..{} as {} lines", prefix, line2, target.len() - suffix - prefix);
        self.doc
            .replace_lines(prefix, line2, &target[prefix..target.len() - suffix])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn rollback(&mut self, rollback: &Rollback) {
        match rollback {
            Rollback::None => {}
            Rollback::All => self.tracker.rollback_all(&mut self.doc),
            Rollback::Lines(spans) => {
                let mut lines = CompressedIndex::new(self.doc.line_count());
                for &(line1, line2) in spans {
                    lines.mark(line1, line2);
                }
                self.tracker.rollback_lines(&mut self.doc, &lines);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.tracker.release(&mut self.doc);
    }
}

// ──────────────────────────────────────────────
// Entry point
// ──────────────────────────────────────────────

/// Returns whether the current file still differs from the base.
fn run(options: &Options) -> io::Result<bool> {
    let settings = settings::load_settings(options.settings.as_deref());
    let base = fs::read_to_string(&options.base)?;
    let current = fs::read_to_string(&options.current)?;

    let mut session = Session::open(&options.current, &base, settings.tracker);
    session.replay(&current)?;
    session.rollback(&options.rollback());

    let Some(ranges) = session.tracker.ranges_synced(&session.doc) else {
        log::warn!("{}: diff too large, no ranges reported", options.current.display());
        return Ok(true);
    };
    print!("{}", report::render(&ranges, &split_lines(&base), session.doc.lines()));

    if options.write {
        fs::write(&options.current, session.doc.text())?;
        log::info!("wrote {}", options.current.display());
    }
    Ok(!ranges.is_empty())
}

fn main() -> ExitCode {
    env_logger::init();

    let options = Options::parse();

    match run(&options) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("linestat: {}", e);
            ExitCode::from(2)
        }
    }
}
