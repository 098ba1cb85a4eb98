//! Horizontal alignment — time-indexed columns within one measure.
//!
//! A measure's content is funneled into `Alignment` columns, one per
//! distinct musical time point. Elements on different staves that sound
//! together share a column, which is what keeps them vertically aligned on
//! the page. Spacing happens in two passes: an ideal-spacing pass that
//! positions columns proportionally to the time elapsed between them, and a
//! shift-integration pass that folds each column's accumulated width
//! requirements into the running positions. A justification pass can then
//! stretch (or compress) the measure to a target width.

use serde::Serialize;

use crate::model::DurationClass;
use crate::style::{times_equal, Style};

/// Column categories, in layout order.
///
/// The ordering is the tie-break key for columns at the same musical time:
/// a clef change and a note at the same time point get two columns, clef
/// first. The variants between `ClefAttr` and `MeterSigAttr` form the
/// non-justifiable attribute region at the start of a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AlignmentType {
    MeasureStart,
    ClefAttr,
    KeySigAttr,
    MensurAttr,
    MeterSigAttr,
    Default,
    FullMeasure,
    FullMeasure2,
    MeasureEnd,
}

/// Running state for the ideal-spacing pass.
#[derive(Debug)]
pub struct HorizontalSpacingContext {
    /// Time of the previously visited column
    pub previous_time: f64,
    /// Resolved position of the previously visited column
    pub previous_x_rel: i32,
    /// Longest duration class present in the measure
    pub longest_dur: DurationClass,
}

impl HorizontalSpacingContext {
    pub fn new(longest_dur: DurationClass) -> Self {
        Self { previous_time: 0.0, previous_x_rel: 0, longest_dur }
    }
}

/// Running state for the shift-integration pass.
#[derive(Debug, Default)]
pub struct XShiftIntegrationContext {
    /// Shift accumulated from the columns visited so far
    pub shift: i32,
    /// Snapshot of the non-justifiable margin, captured at the first
    /// column past the attribute region; `None` until then
    pub justifiable_shift: Option<i32>,
    /// Running minimum width of the measure being integrated
    pub min_measure_width: i32,
}

/// Running state for the justification pass.
#[derive(Debug)]
pub struct JustificationContext {
    /// System-wide justification ratio (target width ÷ natural width)
    pub ratio: f64,
    /// Per-measure ratio, damped by the measure's non-justifiable margin
    pub measure_ratio: f64,
    /// The current measure's non-justifiable margin
    pub margin: i32,
}

impl JustificationContext {
    pub fn new(ratio: f64) -> Self {
        Self { ratio, measure_ratio: 1.0, margin: 0 }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Alignment
// ═══════════════════════════════════════════════════════════════════════

/// One horizontal column: every element at one musical time point.
#[derive(Debug, Clone)]
pub struct Alignment {
    time: f64,
    kind: AlignmentType,
    x_rel: i32,
    x_shift: i32,
    max_width: i32,
    grace: Option<Box<GraceAligner>>,
}

impl Alignment {
    pub fn new(time: f64, kind: AlignmentType) -> Self {
        Self { time, kind, x_rel: 0, x_shift: 0, max_width: 0, grace: None }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn kind(&self) -> AlignmentType {
        self.kind
    }

    /// Resolved position, relative to the measure origin.
    pub fn x_rel(&self) -> i32 {
        self.x_rel
    }

    pub fn set_x_rel(&mut self, x_rel: i32) {
        self.x_rel = x_rel;
    }

    /// Pending width contribution, not yet folded into positions.
    pub fn x_shift(&self) -> i32 {
        self.x_shift
    }

    /// Bid for horizontal room at this column. Larger bids win; a smaller
    /// bid never shrinks an earlier one.
    pub fn set_x_shift(&mut self, x_shift: i32) {
        if x_shift > self.x_shift {
            self.x_shift = x_shift;
        }
    }

    /// Widest element registered at this column.
    pub fn max_width(&self) -> i32 {
        self.max_width
    }

    /// Monotone like [`set_x_shift`](Self::set_x_shift).
    pub fn set_max_width(&mut self, max_width: i32) {
        if max_width > self.max_width {
            self.max_width = max_width;
        }
    }

    /// The grace-note sub-aligner for this column, created on first access.
    pub fn grace_aligner(&mut self) -> &mut GraceAligner {
        self.grace.get_or_insert_with(Box::default)
    }

    pub fn has_grace_aligner(&self) -> bool {
        self.grace.is_some()
    }

    pub fn grace(&self) -> Option<&GraceAligner> {
        self.grace.as_deref()
    }

    /// Ideal-spacing step: place this column after the previous one,
    /// proportionally to the time elapsed in between.
    pub fn set_alignment_x_pos(&mut self, ctx: &mut HorizontalSpacingContext, style: &Style) {
        let mut interval_x_rel = 0;
        let interval_time = self.time - ctx.previous_time;
        if interval_time > 0.0 {
            interval_x_rel = horizontal_space_for_duration(
                interval_time,
                ctx.longest_dur,
                style.spacing_linear,
                style.spacing_non_linear,
            );
        }
        self.x_rel = ctx.previous_x_rel + interval_x_rel * style.definition_factor;
        ctx.previous_time = self.time;
        ctx.previous_x_rel = self.x_rel;
    }

    /// Shift-integration step: fold the pending shift into the position and
    /// pass it on to every following column. Also captures the measure's
    /// non-justifiable margin at the attribute/content boundary and clamps
    /// the end sentinel to the minimum measure width.
    fn integrate_x_shift(
        &mut self,
        ctx: &mut XShiftIntegrationContext,
        non_justifiable_margin: &mut i32,
    ) {
        self.x_rel += self.x_shift + ctx.shift;
        ctx.shift += self.x_shift;

        if self.kind <= AlignmentType::MeterSigAttr && ctx.justifiable_shift.is_none() {
            // still in the attribute region: the last attribute column's
            // extent is the margin candidate
            *non_justifiable_margin = self.x_rel + self.max_width;
        } else if self.kind > AlignmentType::MeterSigAttr && ctx.justifiable_shift.is_none() {
            ctx.justifiable_shift = Some(*non_justifiable_margin);
        }

        if self.kind == AlignmentType::FullMeasure2 {
            ctx.min_measure_width *= 2;
        } else if self.kind == AlignmentType::MeasureEnd {
            self.x_rel = self
                .x_rel
                .max(ctx.min_measure_width + ctx.justifiable_shift.unwrap_or(0));
        }

        self.x_shift = 0;
    }

    /// Justification step: rescale the distance beyond the non-justifiable
    /// margin. The start sentinel anchors the measure, the end sentinel
    /// scales by the plain system ratio, and attribute columns never move.
    pub fn justify_x(&mut self, ctx: &JustificationContext) {
        if self.kind == AlignmentType::MeasureStart {
            return;
        } else if self.kind == AlignmentType::MeasureEnd {
            self.x_rel = (ctx.ratio * self.x_rel as f64).ceil() as i32;
            return;
        }

        if self.kind < AlignmentType::ClefAttr || self.kind > AlignmentType::MeterSigAttr {
            self.x_rel = ((self.x_rel as f64 - ctx.margin as f64) * ctx.measure_ratio).ceil()
                as i32
                + ctx.margin;
        }
    }
}

/// Ideal horizontal space for a time interval, ignoring glyph widths (those
/// are added by shift integration). Space grows with the interval through a
/// tunable power curve; strictly proportional spacing is `non_linear = 1.0`.
/// When the measure's longest duration exceeds a semibreve — mensural music
/// with longas or maximas — intervals are rescaled so that the longest one
/// gets no more room than a semibreve ordinarily would.
pub fn horizontal_space_for_duration(
    interval_time: f64,
    longest_dur: DurationClass,
    spacing_linear: f64,
    spacing_non_linear: f64,
) -> i32 {
    let mut interval_time = interval_time;
    if longest_dur < DurationClass::Whole {
        interval_time /= f64::powi(2.0, -longest_dur.halvings_from_whole());
    }
    (interval_time.powf(spacing_non_linear) * spacing_linear * 10.0) as i32
}

// ═══════════════════════════════════════════════════════════════════════
// MeasureAligner
// ═══════════════════════════════════════════════════════════════════════

/// Owns and orders the columns of one measure.
///
/// The start and end sentinels are structural: they exist from construction
/// and frame the insertable columns, which stay sorted by `(time, kind)`
/// with at most one column per distinct pair.
#[derive(Debug)]
pub struct MeasureAligner {
    left: Alignment,
    right: Alignment,
    columns: Vec<Alignment>,
    non_justifiable_left_margin: i32,
}

impl Default for MeasureAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasureAligner {
    pub fn new() -> Self {
        Self {
            left: Alignment::new(-1.0, AlignmentType::MeasureStart),
            right: Alignment::new(0.0, AlignmentType::MeasureEnd),
            columns: Vec::new(),
            non_justifiable_left_margin: 0,
        }
    }

    /// Drop all columns and margins, keeping fresh sentinels. A full
    /// relayout rebuilds the aligner from scratch.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The measure-start sentinel (time −1.0, always first).
    pub fn left_alignment(&self) -> &Alignment {
        &self.left
    }

    /// The measure-end sentinel (time = measure duration, always last).
    pub fn right_alignment(&self) -> &Alignment {
        &self.right
    }

    /// The insertable columns, in `(time, kind)` order.
    pub fn columns(&self) -> &[Alignment] {
        &self.columns
    }

    /// All columns including both sentinels, in layout order.
    pub fn alignments(&self) -> impl Iterator<Item = &Alignment> {
        std::iter::once(&self.left)
            .chain(self.columns.iter())
            .chain(std::iter::once(&self.right))
    }

    fn alignments_mut(&mut self) -> impl Iterator<Item = &mut Alignment> {
        std::iter::once(&mut self.left)
            .chain(self.columns.iter_mut())
            .chain(std::iter::once(&mut self.right))
    }

    /// X-extent of the leading clef/key/mensuration/meter region, excluded
    /// from justification.
    pub fn non_justifiable_margin(&self) -> i32 {
        self.non_justifiable_left_margin
    }

    /// Natural width of the measure: the end sentinel's position plus the
    /// widest element registered there.
    pub fn width(&self) -> i32 {
        self.right.x_rel + self.right.max_width
    }

    /// The column at `(time, kind)`, creating and inserting it in order if
    /// it does not exist yet. Sentinel kinds are structural and must not be
    /// requested.
    pub fn get_alignment_at_time(&mut self, time: f64, kind: AlignmentType) -> &mut Alignment {
        debug_assert!(
            kind != AlignmentType::MeasureStart && kind != AlignmentType::MeasureEnd,
            "sentinel columns are structural, not insertable"
        );
        let idx = alignment_at_time(&mut self.columns, time, kind);
        &mut self.columns[idx]
    }

    /// The first column at this musical time, if any.
    pub fn find_alignment_at_time(&self, time: f64) -> Option<&Alignment> {
        self.columns.iter().find(|c| times_equal(c.time, time))
    }

    /// Raise the end sentinel's time to `time`. The measure's duration is
    /// the maximum over all layers, never the last write.
    pub fn set_max_time(&mut self, time: f64) {
        if self.right.time < time {
            self.right.time = time;
        }
    }

    /// Resolve every pending grace stack into backward-time columns.
    pub fn align_grace_stacks(&mut self) {
        for column in &mut self.columns {
            if let Some(grace) = column.grace.as_deref_mut() {
                grace.align_stack();
            }
        }
    }

    /// Ideal-spacing pass over all columns in order.
    pub fn set_alignment_x_pos(&mut self, ctx: &mut HorizontalSpacingContext, style: &Style) {
        ctx.previous_time = 0.0;
        ctx.previous_x_rel = 0;
        for column in self.alignments_mut() {
            column.set_alignment_x_pos(ctx, style);
        }
    }

    /// Grace-shift integration pass: resolve every grace sub-aligner's
    /// column positions and total width.
    pub fn integrate_grace_x_shift(&mut self) {
        for column in &mut self.columns {
            if let Some(grace) = column.grace.as_deref_mut() {
                grace.integrate_x_shift();
            }
        }
    }

    /// Shift-integration pass over all columns in order. Captures the
    /// non-justifiable margin and enforces the minimum measure width.
    pub fn integrate_x_shift(&mut self, ctx: &mut XShiftIntegrationContext, style: &Style) {
        ctx.shift = style.left_offset();
        ctx.justifiable_shift = None;
        ctx.min_measure_width = style.min_measure_width_units();

        let mut margin = self.non_justifiable_left_margin;
        for column in self.alignments_mut() {
            column.integrate_x_shift(ctx, &mut margin);
        }
        self.non_justifiable_left_margin = margin;
    }

    /// Justification pass: rescale the measure to the context's ratio,
    /// preserving the non-justifiable margin.
    pub fn justify_x(&mut self, ctx: &mut JustificationContext) {
        let width = self.width();
        ctx.measure_ratio = (ctx.ratio - 1.0)
            * (self.non_justifiable_left_margin as f64 / width as f64)
            + ctx.ratio;
        ctx.margin = self.non_justifiable_left_margin;

        for column in self.alignments_mut() {
            column.justify_x(ctx);
        }
    }
}

/// Scan-or-insert over an ordered column list. Returns the index of the
/// column at `(time, kind)`, inserting a new one at the sort position when
/// no exact match exists.
fn alignment_at_time(columns: &mut Vec<Alignment>, time: f64, kind: AlignmentType) -> usize {
    let mut idx = columns.len();
    for (i, column) in columns.iter().enumerate() {
        if times_equal(column.time, time) {
            if column.kind == kind {
                return i;
            } else if column.kind > kind {
                idx = i;
                break;
            }
        }
        if column.time > time {
            idx = i;
            break;
        }
    }
    columns.insert(idx, Alignment::new(time, kind));
    idx
}

// ═══════════════════════════════════════════════════════════════════════
// GraceAligner
// ═══════════════════════════════════════════════════════════════════════

/// Note reference held between stacking and resolution.
#[derive(Debug, Clone, Copy)]
struct GraceNote {
    duration: f64,
    width: i32,
}

/// Columns for one contiguous run of grace notes attached to a main column.
///
/// Time runs backward from 0: the grace run ends where its main note
/// begins. Notes are stacked as the traversal encounters them and resolved
/// in one shot by [`align_stack`](Self::align_stack).
#[derive(Debug, Clone, Default)]
pub struct GraceAligner {
    columns: Vec<Alignment>,
    note_stack: Vec<GraceNote>,
    total_width: i32,
}

impl GraceAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one grace note onto the stack. The last note stacked is the one
    /// closest to the main note.
    pub fn stack_note(&mut self, duration: f64, width: i32) {
        self.note_stack.push(GraceNote { duration, width });
    }

    /// Number of notes awaiting resolution.
    pub fn stacked_count(&self) -> usize {
        self.note_stack.len()
    }

    /// The resolved grace columns, in increasing (less negative) time order.
    pub fn columns(&self) -> &[Alignment] {
        &self.columns
    }

    /// Width of the whole grace run, set by shift integration.
    pub fn total_width(&self) -> i32 {
        self.total_width
    }

    /// Consume the stack back to front: each note's duration is subtracted
    /// from the running time before its column is created, so the most
    /// recently stacked note lands on the interval just before 0 and
    /// earlier notes land at increasingly negative times. Single-use: the
    /// stack is cleared afterwards.
    pub fn align_stack(&mut self) {
        let mut time = 0.0;
        for i in (0..self.note_stack.len()).rev() {
            let note = self.note_stack[i];
            time -= note.duration;
            let idx = alignment_at_time(&mut self.columns, time, AlignmentType::Default);
            self.columns[idx].set_max_width(note.width);
            self.columns[idx].set_x_shift(note.width);
        }
        self.note_stack.clear();
    }

    /// Fold the grace columns' pending shifts into positions (local origin,
    /// independent of the host measure) and record the run's total width
    /// from the last column's extent.
    pub fn integrate_x_shift(&mut self) {
        let mut shift = 0;
        for column in &mut self.columns {
            column.x_rel = column.x_shift + shift;
            shift += column.x_shift;
        }
        if let Some(last) = self.columns.last() {
            self.total_width = last.x_rel + last.max_width;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered(aligner: &MeasureAligner) {
        let all: Vec<_> = aligner.alignments().collect();
        assert_eq!(all.first().map(|a| a.kind()), Some(AlignmentType::MeasureStart));
        assert_eq!(all.last().map(|a| a.kind()), Some(AlignmentType::MeasureEnd));
        for pair in all.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.time() < b.time() || (times_equal(a.time(), b.time()) && a.kind() < b.kind()),
                "columns out of order: ({}, {:?}) before ({}, {:?})",
                a.time(), a.kind(), b.time(), b.kind()
            );
        }
    }

    #[test]
    fn columns_stay_ordered_for_any_insertion_sequence() {
        let mut aligner = MeasureAligner::new();
        aligner.set_max_time(4.0);
        for (time, kind) in [
            (2.0, AlignmentType::Default),
            (0.0, AlignmentType::Default),
            (-1.0, AlignmentType::KeySigAttr),
            (3.0, AlignmentType::Default),
            (-1.0, AlignmentType::ClefAttr),
            (0.0, AlignmentType::FullMeasure),
            (1.0, AlignmentType::Default),
            (-1.0, AlignmentType::MeterSigAttr),
        ] {
            aligner.get_alignment_at_time(time, kind);
            assert_ordered(&aligner);
        }
        assert_eq!(aligner.columns().len(), 8);
    }

    #[test]
    fn get_alignment_at_time_reuses_exact_matches() {
        let mut aligner = MeasureAligner::new();
        aligner.get_alignment_at_time(1.0, AlignmentType::Default);
        aligner.get_alignment_at_time(1.0, AlignmentType::Default);
        assert_eq!(aligner.columns().len(), 1);

        // same time, different kind: a second column
        aligner.get_alignment_at_time(1.0, AlignmentType::FullMeasure);
        assert_eq!(aligner.columns().len(), 2);
    }

    #[test]
    fn set_max_time_keeps_the_maximum() {
        let mut aligner = MeasureAligner::new();
        aligner.set_max_time(4.0);
        aligner.set_max_time(2.0);
        assert_eq!(aligner.right_alignment().time(), 4.0);
    }

    #[test]
    fn width_bids_are_monotone() {
        let mut column = Alignment::new(0.0, AlignmentType::Default);
        column.set_x_shift(30);
        column.set_x_shift(10);
        assert_eq!(column.x_shift(), 30);
        column.set_max_width(20);
        column.set_max_width(5);
        assert_eq!(column.max_width(), 20);
    }

    #[test]
    fn grace_stack_times_run_backward() {
        let mut grace = GraceAligner::new();
        grace.stack_note(1.0, 9); // A, stacked first
        grace.stack_note(2.0, 9); // B, stacked last
        grace.align_stack();

        let times: Vec<f64> = grace.columns().iter().map(|c| c.time()).collect();
        assert_eq!(times, vec![-3.0, -2.0]);
        assert_eq!(grace.stacked_count(), 0, "the stack is single-use");
    }

    #[test]
    fn grace_integration_sets_total_width() {
        let mut grace = GraceAligner::new();
        grace.stack_note(1.0, 9);
        grace.stack_note(1.0, 9);
        grace.align_stack();
        grace.integrate_x_shift();

        assert_eq!(grace.columns()[0].x_rel(), 9);
        assert_eq!(grace.columns()[1].x_rel(), 18);
        assert_eq!(grace.total_width(), 27);
    }

    #[test]
    fn integration_is_a_prefix_sum_over_pending_shifts() {
        let style = Style { left_position: 0.0, min_measure_width: 0, ..Style::default() };
        let mut aligner = MeasureAligner::new();
        aligner.set_max_time(3.0);
        let shifts = [7, 11, 13];
        for (i, &s) in shifts.iter().enumerate() {
            let col = aligner.get_alignment_at_time(i as f64, AlignmentType::Default);
            col.set_x_shift(s);
        }

        let mut ctx = XShiftIntegrationContext::default();
        aligner.integrate_x_shift(&mut ctx, &style);

        let mut expected = 0;
        for (i, &s) in shifts.iter().enumerate() {
            expected += s;
            assert_eq!(aligner.columns()[i].x_rel(), expected);
            assert_eq!(aligner.columns()[i].x_shift(), 0, "shift is consumed");
        }
    }

    #[test]
    fn long_duration_measures_rescale_intervals() {
        let full = horizontal_space_for_duration(8.0, DurationClass::Quarter, 1.0, 1.0);
        let rescaled = horizontal_space_for_duration(8.0, DurationClass::Breve, 1.0, 1.0);
        assert_eq!(full, 80);
        assert_eq!(rescaled, 40, "a breve-long measure halves its intervals");
    }

    #[test]
    fn justification_anchors_start_and_scales_end() {
        let style = Style::default();
        let mut aligner = MeasureAligner::new();
        aligner.set_max_time(2.0);
        aligner.get_alignment_at_time(-1.0, AlignmentType::ClefAttr).set_x_shift(32);
        aligner.get_alignment_at_time(0.0, AlignmentType::Default).set_x_shift(14);
        aligner.get_alignment_at_time(1.0, AlignmentType::Default).set_x_shift(14);

        let mut ctx = HorizontalSpacingContext::new(DurationClass::Quarter);
        aligner.set_alignment_x_pos(&mut ctx, &style);
        let mut ictx = XShiftIntegrationContext::default();
        aligner.integrate_x_shift(&mut ictx, &style);

        let start_before = aligner.left_alignment().x_rel();
        let end_before = aligner.right_alignment().x_rel();
        let clef_before = aligner.columns()[0].x_rel();
        let margin = aligner.non_justifiable_margin();

        let ratio = 1.5;
        let mut jctx = JustificationContext::new(ratio);
        aligner.justify_x(&mut jctx);

        assert_eq!(aligner.left_alignment().x_rel(), start_before);
        assert_eq!(
            aligner.right_alignment().x_rel(),
            (ratio * end_before as f64).ceil() as i32
        );
        assert_eq!(aligner.columns()[0].x_rel(), clef_before, "attribute columns never move");
        assert_eq!(aligner.non_justifiable_margin(), margin);
    }

    #[test]
    fn full_measure_rest_doubles_the_minimum_width() {
        let style = Style::default();
        let mut narrow = MeasureAligner::new();
        narrow.set_max_time(4.0);
        narrow.get_alignment_at_time(0.0, AlignmentType::FullMeasure).set_x_shift(14);
        let mut ctx = XShiftIntegrationContext::default();
        narrow.integrate_x_shift(&mut ctx, &style);

        let mut wide = MeasureAligner::new();
        wide.set_max_time(4.0);
        wide.get_alignment_at_time(0.0, AlignmentType::FullMeasure2).set_x_shift(14);
        let mut ctx = XShiftIntegrationContext::default();
        wide.integrate_x_shift(&mut ctx, &style);

        let min = style.min_measure_width_units();
        assert_eq!(narrow.right_alignment().x_rel() - min, wide.right_alignment().x_rel() - 2 * min);
    }
}
