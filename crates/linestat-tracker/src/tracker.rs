// LineStatusTracker: keeps the change ranges between a live document and its
// base revision up to date, reconciling only the region that was edited.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use linestat_core::{
    same_spans, ChangeSummary, DirtyNotifier, MarkerHandle, NoopNotifier, NoopRenderer, Range,
    RangeId, RangeRenderer,
};
use linestat_diff::{compute_ranges, DiffError, LcsDiff, LineDiff};
use linestat_editor::{split_lines, Document, DocumentListener, EditEvent, ListenerId};
use linestat_index::CompressedIndex;
use parking_lot::Mutex;

use crate::dirty::DirtyRange;
use crate::error::TrackerError;
use crate::markers::MarkerTable;
use crate::settings::TrackerSettings;

/// Upper bound on how many blank pages one widening step may swallow.
const MAX_BLANK_PAGES: usize = 16;

/// Which way `transfer_line` maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Current document line to base revision line.
    ToBase,
    /// Base revision line to current document line.
    FromBase,
}

/// The external parties a tracker talks to.
pub struct Collaborators {
    pub diff: Box<dyn LineDiff>,
    pub renderer: Arc<dyn RangeRenderer>,
    pub notifier: Arc<dyn DirtyNotifier>,
}

impl Collaborators {
    /// The default LCS diff sized from `settings`, with no renderer or notifier.
    pub fn new(settings: &TrackerSettings) -> Self {
        Self {
            diff: Box::new(LcsDiff::new(settings.max_diff_cells)),
            renderer: Arc::new(NoopRenderer),
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn RangeRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn DirtyNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_diff(mut self, diff: Box<dyn LineDiff>) -> Self {
        self.diff = diff;
        self
    }
}

// ──────────────────────────────────────────────
// State
// ──────────────────────────────────────────────

#[derive(Default)]
struct TrackerState {
    base: Option<Arc<Vec<String>>>,
    ranges: Vec<Range>,
    dirty: Option<DirtyRange>,
    markers: MarkerTable,
    next_id: u64,
    listener: Option<ListenerId>,

    initialized: bool,
    released: bool,
    bulk_update: bool,
    rollback: bool,
    /// The diff refused the input; tracking is off until the next reinstall.
    anathema: bool,

    /// The list went empty; the notifier fires when the transaction ends.
    unchanged_pending: bool,
    reconcile_count: u64,
}

impl TrackerState {
    fn is_suppressed(&self) -> bool {
        !self.initialized || self.released || self.bulk_update || self.rollback || self.anathema
    }

    fn alloc_id(&mut self) -> RangeId {
        self.next_id += 1;
        RangeId(self.next_id)
    }

    fn position_of(&self, id: RangeId) -> Option<usize> {
        self.ranges.iter().position(|r| r.id == id)
    }
}

/// Marker and renderer work gathered under the lock, carried out after it
/// is released.
#[derive(Default)]
struct Effects {
    removed: Vec<(RangeId, Option<MarkerHandle>)>,
    added: Vec<Range>,
    suppressed: Option<bool>,
}

impl Effects {
    fn remove_all(&mut self, state: &mut TrackerState) {
        for r in state.ranges.drain(..) {
            let handle = state.markers.detach(r.id);
            self.removed.push((r.id, handle));
        }
    }
}

// ──────────────────────────────────────────────
// LineStatusTracker
// ──────────────────────────────────────────────

pub struct LineStatusTracker {
    path: PathBuf,
    settings: TrackerSettings,
    diff: Box<dyn LineDiff>,
    renderer: Arc<dyn RangeRenderer>,
    notifier: Arc<dyn DirtyNotifier>,
    coordinator: ThreadId,
    state: Mutex<TrackerState>,
}

impl LineStatusTracker {
    /// Create a tracker for `doc` and register it as the document's listener.
    /// The calling thread becomes the coordinator thread.
    pub fn attach(
        doc: &mut Document,
        path: impl Into<PathBuf>,
        settings: TrackerSettings,
        collaborators: Collaborators,
    ) -> Arc<Self> {
        let tracker = Arc::new(Self {
            path: path.into(),
            settings,
            diff: collaborators.diff,
            renderer: collaborators.renderer,
            notifier: collaborators.notifier,
            coordinator: thread::current().id(),
            state: Mutex::new(TrackerState::default()),
        });
        let id = doc.add_listener(tracker.clone());
        tracker.state.lock().listener = Some(id);
        tracker
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    // ── Lifecycle ──

    /// Install a new base revision and rebuild all ranges from scratch.
    pub fn set_base_revision(&self, doc: &Document, text: &str) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            if state.released {
                log::debug!("set_base_revision on released tracker for {}", self.path.display());
                return;
            }
            state.base = Some(Arc::new(split_lines(text)));
            state.initialized = true;
            if state.anathema {
                state.anathema = false;
                effects.suppressed = Some(false);
            }
            self.reinstall(&mut state, doc.lines(), &mut effects);
        }
        self.apply_effects(effects);
        self.flush_unchanged(doc);
    }

    /// Unregister from the document and dispose every marker. Idempotent.
    pub fn release(&self, doc: &mut Document) {
        let mut effects = Effects::default();
        let listener = {
            let mut state = self.state.lock();
            if state.released {
                return;
            }
            state.released = true;
            state.dirty = None;
            state.unchanged_pending = false;
            effects.remove_all(&mut state);
            state.listener.take()
        };
        if let Some(id) = listener {
            doc.remove_listener(id);
        }
        self.apply_effects(effects);
    }

    pub fn begin_bulk_update(&self) {
        let mut state = self.state.lock();
        if !state.released {
            state.bulk_update = true;
        }
    }

    /// Leave bulk mode. Locality is gone after a bulk edit, so this always
    /// rebuilds everything.
    pub fn end_bulk_update(&self, doc: &Document) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            if state.released || !state.bulk_update {
                return;
            }
            state.bulk_update = false;
            self.reinstall(&mut state, doc.lines(), &mut effects);
        }
        self.apply_effects(effects);
        self.flush_unchanged(doc);
    }

    pub fn is_operational(&self) -> bool {
        let state = self.state.lock();
        state.initialized && !state.released
    }

    pub fn is_suppressed(&self) -> bool {
        self.state.lock().is_suppressed()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Number of incremental reconciliations performed so far.
    pub fn reconcile_count(&self) -> u64 {
        self.state.lock().reconcile_count
    }

    /// The pending dirty window, if edits are waiting to be reconciled.
    pub fn pending_dirty(&self) -> Option<DirtyRange> {
        self.state.lock().dirty
    }

    pub fn marker_count(&self) -> usize {
        self.state.lock().markers.len()
    }

    // ── Reconciliation ──

    /// Bring the ranges up to date with `doc`. Only the coordinator thread
    /// reconciles; elsewhere this does nothing.
    pub fn sync(&self, doc: &Document) {
        if thread::current().id() != self.coordinator {
            return;
        }
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            self.sync_locked(&mut state, doc.lines(), &mut effects);
        }
        self.apply_effects(effects);
        if !doc.in_transaction() {
            self.flush_unchanged(doc);
        }
    }

    fn sync_locked(&self, state: &mut TrackerState, lines: &[String], effects: &mut Effects) {
        if state.is_suppressed() {
            return;
        }
        let Some(dirty) = state.dirty.take() else {
            return;
        };
        match self.reconcile(state, dirty, lines, effects) {
            Ok(()) => {}
            Err(TrackerError::Diff(DiffError::TooLarge { cells, limit })) => {
                log::warn!(
                    "{}: diff too large ({} > {} cells), tracking suppressed",
                    self.path.display(),
                    cells,
                    limit
                );
                self.enter_anathema(state, effects);
            }
            Err(e) => {
                log::error!("{}: {}; reinstalling ranges", self.path.display(), e);
                self.reinstall(state, lines, effects);
            }
        }
    }

    /// Re-diff the dirty window and splice the result into the range list.
    fn reconcile(
        &self,
        state: &mut TrackerState,
        dirty: DirtyRange,
        lines: &[String],
        effects: &mut Effects,
    ) -> Result<(), TrackerError> {
        let total = lines.len();
        if dirty.before_total_lines as isize + dirty.shift != total as isize {
            return Err(TrackerError::Inconsistent(format!(
                "line count {} does not match {} shifted by {}",
                total, dirty.before_total_lines, dirty.shift
            )));
        }
        let base = state
            .base
            .clone()
            .ok_or_else(|| TrackerError::Inconsistent("no base revision".to_string()))?;

        // Partition: before | changed | after, in batch coordinates.
        let first_changed = state.ranges.partition_point(|r| r.line2 < dirty.line1);
        let first_after = state.ranges.partition_point(|r| r.line1 <= dirty.line2);
        let changed = &state.ranges[first_changed..first_after];

        let before_delta = match first_changed.checked_sub(1) {
            Some(i) => {
                let r = &state.ranges[i];
                r.base_line2 as isize - r.line2 as isize
            }
            None => 0,
        };
        let changed_delta: isize = changed
            .iter()
            .map(|r| r.base_len() as isize - r.current_len() as isize)
            .sum();

        // Never bisect a changed range.
        let mut line1 = changed.first().map_or(dirty.line1, |r| r.line1.min(dirty.line1));
        let line2 = changed.last().map_or(dirty.line2, |r| r.line2.max(dirty.line2));
        let mut base_line1 = line1 as isize + before_delta;
        let mut base_line2 = line2 as isize + before_delta + changed_delta;
        let mut current_line2 = (line2 as isize + dirty.shift).max(line1 as isize) as usize;

        if self.settings.skip_blank_lines {
            let floor = first_changed
                .checked_sub(1)
                .map_or(0, |i| state.ranges[i].line2 + 1);
            let ceiling = state.ranges.get(first_after).map_or(total, |r| {
                (r.line1 as isize + dirty.shift - 1).max(0) as usize
            });
            let page = self.settings.blank_page_lines.max(1);

            let widened1 = widen_up(lines, floor, line1, page);
            base_line1 -= (line1 - widened1) as isize;
            line1 = widened1;

            let widened2 = widen_down(lines, ceiling, current_line2, page);
            base_line2 += (widened2 - current_line2) as isize;
            current_line2 = widened2;
        }

        if current_line2 > total
            || base_line1 < 0
            || base_line2 < base_line1
            || base_line2 as usize > base.len()
        {
            return Err(TrackerError::Inconsistent(format!(
                "window {}..{} / base {}..{} outside document ({} / {} lines)",
                line1,
                current_line2,
                base_line1,
                base_line2,
                total,
                base.len()
            )));
        }
        let (base_line1, base_line2) = (base_line1 as usize, base_line2 as usize);

        log::debug!(
            "{}: reconciling {}..{} against base {}..{}",
            self.path.display(),
            line1,
            current_line2,
            base_line1,
            base_line2
        );

        let fresh = compute_ranges(
            self.diff.as_ref(),
            &lines[line1..current_line2],
            &base[base_line1..base_line2],
            line1,
            base_line1,
        )?;

        let was_empty = state.ranges.is_empty();
        for r in &mut state.ranges[first_after..] {
            r.shift(dirty.shift);
        }

        if !same_spans(&state.ranges[first_changed..first_after], &fresh) {
            let fresh: Vec<Range> = fresh
                .into_iter()
                .map(|r| {
                    let id = state.alloc_id();
                    r.with_id(id)
                })
                .collect();
            effects.added.extend(fresh.iter().cloned());
            let removed: Vec<Range> = state
                .ranges
                .splice(first_changed..first_after, fresh)
                .collect();
            for r in removed {
                let handle = state.markers.detach(r.id);
                effects.removed.push((r.id, handle));
            }
        }
        debug_assert!(is_well_formed(&state.ranges), "ranges overlap after reconcile");

        if !was_empty && state.ranges.is_empty() {
            state.unchanged_pending = true;
        }
        state.reconcile_count += 1;
        Ok(())
    }

    /// Throw away every range and diff the whole file again.
    fn reinstall(&self, state: &mut TrackerState, lines: &[String], effects: &mut Effects) {
        let was_empty = state.ranges.is_empty();
        state.dirty = None;
        effects.remove_all(state);
        if !state.initialized || state.released {
            return;
        }
        let Some(base) = state.base.clone() else {
            return;
        };

        match compute_ranges(self.diff.as_ref(), lines, &base, 0, 0) {
            Ok(ranges) => {
                for r in ranges {
                    let id = state.alloc_id();
                    let r = r.with_id(id);
                    effects.added.push(r.clone());
                    state.ranges.push(r);
                }
                if state.anathema {
                    state.anathema = false;
                    effects.suppressed = Some(false);
                }
                if !was_empty && state.ranges.is_empty() {
                    state.unchanged_pending = true;
                }
            }
            Err(DiffError::TooLarge { cells, limit }) => {
                log::warn!(
                    "{}: diff too large ({} > {} cells), tracking suppressed",
                    self.path.display(),
                    cells,
                    limit
                );
                self.enter_anathema(state, effects);
            }
            Err(e) => {
                // The primitive itself is broken; retrying would loop.
                log::error!("{}: full diff failed: {}", self.path.display(), e);
                self.enter_anathema(state, effects);
            }
        }
    }

    fn enter_anathema(&self, state: &mut TrackerState, effects: &mut Effects) {
        state.dirty = None;
        effects.remove_all(state);
        if !state.anathema {
            state.anathema = true;
            effects.suppressed = Some(true);
        }
    }

    fn apply_effects(&self, effects: Effects) {
        let Effects { removed, added, suppressed } = effects;

        for (_, handle) in &removed {
            if let Some(handle) = handle {
                self.renderer.dispose_marker(*handle);
            }
        }

        let created: Vec<(RangeId, MarkerHandle)> = added
            .iter()
            .map(|r| (r.id, self.renderer.create_marker(r)))
            .collect();
        let mut orphans = Vec::new();
        if !created.is_empty() {
            let mut state = self.state.lock();
            let live: HashSet<RangeId> = state.ranges.iter().map(|r| r.id).collect();
            for (id, handle) in created {
                // Replaced again before its marker arrived.
                if !live.contains(&id) {
                    orphans.push(handle);
                } else if let Err(handle) = state.markers.attach(id, handle) {
                    orphans.push(handle);
                }
            }
        }
        for handle in orphans {
            self.renderer.dispose_marker(handle);
        }

        if !removed.is_empty() || !added.is_empty() {
            let removed_ids: Vec<RangeId> = removed.iter().map(|(id, _)| *id).collect();
            let added_ids: Vec<RangeId> = added.iter().map(|r| r.id).collect();
            self.renderer.ranges_replaced(&removed_ids, &added_ids);
        }
        if let Some(suppressed) = suppressed {
            self.renderer.tracking_suppressed(suppressed);
        }
    }

    /// Fire the pending "no longer changed" notice, at most once.
    fn flush_unchanged(&self, doc: &Document) {
        if doc.in_transaction() {
            return;
        }
        let pending = std::mem::take(&mut self.state.lock().unchanged_pending);
        if pending {
            log::debug!("{}: no longer differs from base", self.path.display());
            self.notifier.file_dirty(&self.path);
        }
    }

    // ── Rollback ──

    /// Restore the base text of one range.
    pub fn rollback_range(&self, doc: &mut Document, range: &Range) {
        self.sync(doc);
        let live = {
            let state = self.state.lock();
            if state.is_suppressed() {
                None
            } else {
                state.position_of(range.id).map(|i| state.ranges[i].clone())
            }
        };
        match live {
            Some(r) => self.rollback_ranges(doc, vec![r]),
            None => log::warn!(
                "{}: rollback of range {:?} ignored, not installed",
                self.path.display(),
                range.id
            ),
        }
    }

    /// Restore the base text of every range touching a marked line.
    pub fn rollback_lines(&self, doc: &mut Document, lines: &CompressedIndex) {
        if let Some(selected) = self.ranges_for_lines(doc, lines) {
            if !selected.is_empty() {
                self.rollback_ranges(doc, selected);
            }
        }
    }

    fn rollback_ranges(&self, doc: &mut Document, selected: Vec<Range>) {
        let base = {
            let mut state = self.state.lock();
            if state.is_suppressed() {
                log::debug!("{}: rollback while suppressed ignored", self.path.display());
                return;
            }
            let Some(base) = state.base.clone() else {
                return;
            };
            state.rollback = true;
            base
        };

        doc.begin_transaction();
        let result = apply_rollback(doc, &base, &selected);

        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            state.rollback = false;
            if let Err(e) = result {
                log::error!("{}: rollback failed: {}; reinstalling", self.path.display(), e);
                self.reinstall(&mut state, doc.lines(), &mut effects);
            }
        }
        self.apply_effects(effects);
        doc.end_transaction();
        self.sync(doc);
    }

    /// Replace the whole document with the base text and drop every range.
    pub fn rollback_all(&self, doc: &mut Document) {
        let base_text = {
            let mut state = self.state.lock();
            if state.released || !state.initialized {
                return;
            }
            let Some(base) = state.base.as_ref() else {
                return;
            };
            let text = base.join("\n");
            state.rollback = true;
            text
        };

        let result = doc.set_text(&base_text);

        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            state.rollback = false;
            if let Err(e) = result {
                log::error!("{}: rollback failed: {}; reinstalling", self.path.display(), e);
            }
            // Matches the base on success, so this is a prefix-only diff.
            self.reinstall(&mut state, doc.lines(), &mut effects);
        }
        self.apply_effects(effects);
        self.flush_unchanged(doc);
    }

    // ── Queries ──

    /// Snapshot of the ranges without reconciling. Safe from any thread.
    /// `None` while tracking is suppressed.
    pub fn ranges(&self) -> Option<Vec<Range>> {
        let state = self.state.lock();
        if state.is_suppressed() {
            return None;
        }
        Some(state.ranges.clone())
    }

    /// Reconcile (on the coordinator thread), then snapshot.
    pub fn ranges_synced(&self, doc: &Document) -> Option<Vec<Range>> {
        self.sync(doc);
        self.ranges()
    }

    fn with_ranges<R>(&self, doc: &Document, f: impl FnOnce(&[Range]) -> R) -> Option<R> {
        self.sync(doc);
        let state = self.state.lock();
        if state.is_suppressed() {
            return None;
        }
        Some(f(&state.ranges))
    }

    pub fn range_for_line(&self, doc: &Document, line: usize) -> Option<Range> {
        self.with_ranges(doc, |ranges| {
            let start = ranges.partition_point(|r| r.line2 < line);
            ranges[start..]
                .iter()
                .take_while(|r| r.line1 <= line)
                .find(|r| r.contains_line(line))
                .cloned()
        })
        .flatten()
    }

    /// First range strictly below `line`.
    pub fn next_range(&self, doc: &Document, line: usize) -> Option<Range> {
        self.with_ranges(doc, |ranges| ranges.iter().find(|r| r.is_after(line)).cloned())
            .flatten()
    }

    /// Last range strictly above `line`.
    pub fn prev_range(&self, doc: &Document, line: usize) -> Option<Range> {
        self.with_ranges(doc, |ranges| ranges.iter().rev().find(|r| r.is_before(line)).cloned())
            .flatten()
    }

    /// List neighbour following `range`, if `range` is still live.
    pub fn next_range_after(&self, doc: &Document, range: &Range) -> Option<Range> {
        self.neighbour(doc, range, 1)
    }

    /// List neighbour preceding `range`, if `range` is still live.
    pub fn prev_range_before(&self, doc: &Document, range: &Range) -> Option<Range> {
        self.neighbour(doc, range, -1)
    }

    fn neighbour(&self, doc: &Document, range: &Range, step: isize) -> Option<Range> {
        self.sync(doc);
        let state = self.state.lock();
        if state.is_suppressed() {
            return None;
        }
        let Some(i) = state.position_of(range.id) else {
            log::warn!("{}: stale range {:?} used for navigation", self.path.display(), range.id);
            return None;
        };
        let j = i.checked_add_signed(step)?;
        state.ranges.get(j).cloned()
    }

    /// Whether any range touches `[line1, line2)`. `None` when unknown.
    pub fn is_range_modified(&self, doc: &Document, line1: usize, line2: usize) -> Option<bool> {
        self.with_ranges(doc, |ranges| {
            let start = ranges.partition_point(|r| r.line2 < line1);
            ranges[start..]
                .iter()
                .take_while(|r| r.line1 <= line2)
                .any(|r| r.intersects(line1, line2))
        })
    }

    pub fn is_line_modified(&self, doc: &Document, line: usize) -> Option<bool> {
        self.is_range_modified(doc, line, line + 1)
    }

    /// Ranges touching any line marked in `lines`.
    pub fn ranges_for_lines(&self, doc: &Document, lines: &CompressedIndex) -> Option<Vec<Range>> {
        self.with_ranges(doc, |ranges| {
            ranges
                .iter()
                .filter(|r| lines.check(r.line1, r.line2.max(r.line1 + 1)))
                .cloned()
                .collect()
        })
    }

    /// Map a line between the two revisions, approximating inside uneven
    /// hunks according to the settings.
    pub fn transfer_line(&self, doc: &Document, line: usize, direction: TransferDirection) -> Option<usize> {
        self.transfer_line_with(doc, line, direction, self.settings.approximate_transfer)
    }

    /// Map a line between the two revisions. A line inside a hunk whose sides
    /// differ in length has no exact counterpart: `None` unless `approximate`.
    pub fn transfer_line_with(
        &self,
        doc: &Document,
        line: usize,
        direction: TransferDirection,
        approximate: bool,
    ) -> Option<usize> {
        self.with_ranges(doc, |ranges| transfer(ranges, line, direction, approximate))
            .flatten()
    }

    pub fn summary(&self, doc: &Document) -> Option<ChangeSummary> {
        self.with_ranges(doc, ChangeSummary::from_ranges)
    }

    /// Base revision text covered by `range`.
    pub fn base_text_for(&self, range: &Range) -> Option<String> {
        let state = self.state.lock();
        let base = state.base.as_ref()?;
        base.get(range.base_line1..range.base_line2).map(|l| l.join("\n"))
    }

    /// Current document text covered by `range`.
    pub fn current_text_for(&self, doc: &Document, range: &Range) -> Option<String> {
        doc.lines().get(range.line1..range.line2).map(|l| l.join("\n"))
    }
}

// ──────────────────────────────────────────────
// Document listener
// ──────────────────────────────────────────────

impl DocumentListener for LineStatusTracker {
    fn before_change(&self, event: &EditEvent, doc: &Document) {
        let mut state = self.state.lock();
        if state.released {
            return;
        }
        let (line1, line2) = event.old_line_span();
        let shift = event.line_delta();
        state.dirty = Some(match state.dirty.take() {
            Some(dirty) => dirty.widen(line1, line2, shift),
            None => DirtyRange::new(line1, line2, shift, doc.line_count()),
        });
    }

    fn transaction_finished(&self, doc: &Document) {
        self.sync(doc);
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Write base text over each selected range, top to bottom, correcting for
/// the length changes of the ones already written.
fn apply_rollback(doc: &mut Document, base: &[String], selected: &[Range]) -> Result<(), TrackerError> {
    let mut shift: isize = 0;
    for r in selected {
        let replacement = base.get(r.base_line1..r.base_line2).ok_or_else(|| {
            TrackerError::Inconsistent(format!(
                "base interval {}..{} outside base ({} lines)",
                r.base_line1,
                r.base_line2,
                base.len()
            ))
        })?;
        let line1 = r.line1.saturating_add_signed(shift);
        let line2 = r.line2.saturating_add_signed(shift);
        doc.replace_lines(line1, line2, replacement)?;
        shift += r.base_len() as isize - r.current_len() as isize;
    }
    Ok(())
}

fn transfer(ranges: &[Range], line: usize, direction: TransferDirection, approximate: bool) -> Option<usize> {
    let mut delta: isize = 0;
    for r in ranges {
        let (from1, from2, to1, to2) = match direction {
            TransferDirection::ToBase => (r.line1, r.line2, r.base_line1, r.base_line2),
            TransferDirection::FromBase => (r.base_line1, r.base_line2, r.line1, r.line2),
        };
        if line < from1 {
            break;
        }
        if line < from2 {
            let offset = line - from1;
            if from2 - from1 == to2 - to1 {
                return Some(to1 + offset);
            }
            if approximate {
                return Some(to1 + offset.min((to2 - to1).saturating_sub(1)));
            }
            return None;
        }
        delta = to2 as isize - from2 as isize;
    }
    Some(line.saturating_add_signed(delta))
}

/// Move `line1` up across whole pages of blank lines, never below `floor`.
fn widen_up(lines: &[String], floor: usize, line1: usize, page: usize) -> usize {
    let horizon = floor.max(line1.saturating_sub(page * MAX_BLANK_PAGES));
    if horizon >= line1 {
        return line1;
    }
    let occupied = non_blank_index(&lines[horizon..line1]);
    let mut start = line1 - horizon;
    while let Some(page_start) = start.checked_sub(page) {
        if occupied.check(page_start, start) {
            break;
        }
        start = page_start;
    }
    horizon + start
}

/// Move `line2` down across whole pages of blank lines, never past `ceiling`.
fn widen_down(lines: &[String], ceiling: usize, line2: usize, page: usize) -> usize {
    let horizon = ceiling.min(lines.len()).min(line2 + page * MAX_BLANK_PAGES);
    if horizon <= line2 {
        return line2;
    }
    let occupied = non_blank_index(&lines[line2..horizon]);
    let span = horizon - line2;
    let mut end = 0;
    while end + page <= span {
        if occupied.check(end, end + page) {
            break;
        }
        end += page;
    }
    line2 + end
}

fn non_blank_index(lines: &[String]) -> CompressedIndex {
    CompressedIndex::from_lines(
        lines.len(),
        lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, _)| i),
    )
}

/// Sorted and pairwise non-overlapping in both coordinate spaces.
fn is_well_formed(ranges: &[Range]) -> bool {
    ranges.iter().all(|r| r.is_valid() && r.id.is_assigned())
        && ranges
            .windows(2)
            .all(|w| w[0].line2 <= w[1].line1 && w[0].base_line2 <= w[1].base_line1)
}
