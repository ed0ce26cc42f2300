// Command-line options.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rollback {
    None,
    All,
    /// Zero-based half-open line spans.
    Lines(Vec<(usize, usize)>),
}

#[derive(Debug, Parser)]
#[command(
    name = "linestat",
    version,
    about = "Print the changed line ranges of a file against its base revision"
)]
#[command(group(ArgGroup::new("rollback_target").args(["rollback", "rollback_all"])))]
pub struct Options {
    /// Base revision of the file.
    pub base: PathBuf,

    /// Working copy to compare against the base.
    pub current: PathBuf,

    /// Read settings from this file instead of the config directory.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Restore lines a..=b (one-based) from the base. Repeatable.
    #[arg(long, value_name = "A[-B]", value_parser = parse_span, conflicts_with = "rollback_all")]
    pub rollback: Vec<(usize, usize)>,

    /// Restore the whole base.
    #[arg(long)]
    pub rollback_all: bool,

    /// Save the rolled-back text over the working copy.
    #[arg(long, requires = "rollback_target")]
    pub write: bool,
}

impl Options {
    pub fn rollback(&self) -> Rollback {
        if self.rollback_all {
            Rollback::All
        } else if self.rollback.is_empty() {
            Rollback::None
        } else {
            Rollback::Lines(self.rollback.clone())
        }
    }
}

/// `7` or `3-5`, one-based and inclusive.
fn parse_span(value: &str) -> Result<(usize, usize), String> {
    let (a, b) = value.split_once('-').unwrap_or((value, value));
    let number = |s: &str| {
        s.trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("bad line number {:?}", s))
    };
    let (a, b) = (number(a)?, number(b)?);
    if b < a {
        return Err(format!("empty line span {}", value));
    }
    Ok((a - 1, b))
}
