//! Vertical alignment — stacking staves within one system.
//!
//! Each staff gets a `StaffAlignment` that accumulates, over every measure
//! of the system, how much room the staff needs: content overflow, lyric
//! verses, and the dynamics/directives/hairpins hanging above or below it.
//! Two passes then mirror the horizontal engine: a spacing pass that turns
//! the accumulated requirements into per-staff shifts, and an integration
//! pass that folds the shifts into resolved positions. Y grows upward, so
//! every shift and resolved offset here is ≤ 0.

use serde::Serialize;

use crate::model::{MarkKind, Place, StaffDef};
use crate::style::Style;

/// Running state for the vertical spacing pass.
#[derive(Debug, Default)]
pub struct VerticalSpacingContext {
    /// Height of the previously visited staff; `None` at the top of a
    /// system, where no staff gap applies
    pub previous_staff_height: Option<i32>,
    /// Annotation room still owed to the gap above the next staff
    pub extra_height: i32,
}

impl VerticalSpacingContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Remembered horizontal extent of a floating element, keyed by the
/// element's identity and reused across layout passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloatingBoundingBox {
    /// Left edge of the element's content
    pub content_x1: i32,
}

// ═══════════════════════════════════════════════════════════════════════
// StaffAlignment
// ═══════════════════════════════════════════════════════════════════════

/// Vertical layout record for one staff within a system.
#[derive(Debug, Clone)]
pub struct StaffAlignment {
    y_rel: i32,
    y_shift: i32,
    max_height: i32,
    verse_count: i32,
    staff: Option<StaffDef>,
    dir_above: bool,
    dir_below: bool,
    dynam_above: bool,
    dynam_below: bool,
    hairpin_above: bool,
    hairpin_below: bool,
    boxes: Vec<(u32, FloatingBoundingBox)>,
}

impl StaffAlignment {
    fn new(staff: Option<StaffDef>) -> Self {
        Self {
            y_rel: 0,
            y_shift: 0,
            max_height: 0,
            verse_count: 0,
            staff,
            dir_above: false,
            dir_below: false,
            dynam_above: false,
            dynam_below: false,
            hairpin_above: false,
            hairpin_below: false,
            boxes: Vec::new(),
        }
    }

    /// The staff this record lays out; `None` for the bottom sentinel.
    pub fn staff(&self) -> Option<&StaffDef> {
        self.staff.as_ref()
    }

    /// Resolved offset from the system top (≤ 0, downward).
    pub fn y_rel(&self) -> i32 {
        self.y_rel
    }

    /// Pending shift, not yet folded into positions (≤ 0).
    pub fn y_shift(&self) -> i32 {
        self.y_shift
    }

    /// Request more room above this staff. The most negative request wins;
    /// a smaller one never shrinks the reservation.
    pub fn set_y_shift(&mut self, y_shift: i32) {
        if y_shift < self.y_shift {
            self.y_shift = y_shift;
        }
    }

    /// Lowest content extent below the staff (≤ 0, downward).
    pub fn max_height(&self) -> i32 {
        self.max_height
    }

    /// Monotone like [`set_y_shift`](Self::set_y_shift).
    pub fn set_max_height(&mut self, max_height: i32) {
        if max_height < self.max_height {
            self.max_height = max_height;
        }
    }

    pub fn verse_count(&self) -> i32 {
        self.verse_count
    }

    /// Report lyric verses under this staff. A report of 0 still means one
    /// verse line; the largest report over the system wins.
    pub fn set_verse_count(&mut self, verse_count: i32) {
        let verse_count = verse_count.max(1);
        if verse_count > self.verse_count {
            self.verse_count = verse_count;
        }
    }

    pub fn dir_above(&self) -> bool {
        self.dir_above
    }

    pub fn dynam_above(&self) -> bool {
        self.dynam_above
    }

    pub fn hairpin_above(&self) -> bool {
        self.hairpin_above
    }

    pub fn dir_below(&self) -> bool {
        self.dir_below
    }

    pub fn dynam_below(&self) -> bool {
        self.dynam_below
    }

    pub fn hairpin_below(&self) -> bool {
        self.hairpin_below
    }

    /// Note the presence of a floating mark on this staff. Flags only ever
    /// turn on; the spacing pass reads them once per system.
    pub fn register_mark(&mut self, kind: MarkKind, place: Place) {
        match (kind, place) {
            (MarkKind::Directive, Place::Above) => self.dir_above = true,
            (MarkKind::Directive, Place::Below) => self.dir_below = true,
            (MarkKind::Dynamic, Place::Above) => self.dynam_above = true,
            (MarkKind::Dynamic, Place::Below) => self.dynam_below = true,
            (MarkKind::Hairpin, Place::Above) => self.hairpin_above = true,
            (MarkKind::Hairpin, Place::Below) => self.hairpin_below = true,
        }
    }

    /// The bounding-box record for a floating element, created with the
    /// given x on first registration and returned untouched afterwards.
    pub fn set_current_bounding_box(&mut self, id: u32, x: i32) -> &mut FloatingBoundingBox {
        if let Some(i) = self.boxes.iter().position(|(box_id, _)| *box_id == id) {
            return &mut self.boxes[i].1;
        }
        self.boxes.push((id, FloatingBoundingBox { content_x1: x }));
        let last = self.boxes.len() - 1;
        &mut self.boxes[last].1
    }

    /// The stored bounding box for a floating element, if registered.
    pub fn bounding_box(&self, id: u32) -> Option<&FloatingBoundingBox> {
        self.boxes.iter().find(|(box_id, _)| *box_id == id).map(|(_, b)| b)
    }

    /// All registered bounding boxes, in registration order.
    pub fn bounding_boxes(&self) -> impl Iterator<Item = (u32, &FloatingBoundingBox)> {
        self.boxes.iter().map(|(id, b)| (*id, b))
    }

    /// Vertical spacing step. Works out the minimum gap to the previous
    /// staff, adds whatever part of the pending annotation room that gap
    /// does not already cover, and hands the next staff this staff's height
    /// plus the room its own below-staff annotations will need.
    pub fn set_alignment_y_pos(&mut self, ctx: &mut VerticalSpacingContext, style: &Style) {
        let staff_size = self.staff.as_ref().map_or(100, |s| s.size);
        let lines = self.staff.as_ref().map_or(5, |s| s.lines);

        let min_shift = match ctx.previous_staff_height {
            None => 0,
            Some(previous) => style.spacing_staff * style.drawing_unit(100) + previous,
        };

        if self.dynam_above || self.dir_above {
            ctx.extra_height += style.drawing_dynam_height(staff_size);
        } else if self.hairpin_above {
            ctx.extra_height += style.drawing_hairpin_height(staff_size);
        }

        if ctx.extra_height > 0 {
            let mut missing_extra_height = ctx.extra_height;
            // room the minimum gap already guarantees beyond the shift
            // requested so far
            let existing_extra_height = min_shift - (-self.y_shift);
            if existing_extra_height > 0 {
                missing_extra_height -= existing_extra_height;
            }
            if missing_extra_height > 0 {
                self.y_shift -= missing_extra_height;
            }
        }

        if min_shift > -self.y_shift {
            self.y_shift = -min_shift;
        }

        ctx.previous_staff_height = Some((lines - 1) * style.drawing_double_unit(staff_size));

        ctx.extra_height = 0;
        if self.verse_count > 0 {
            ctx.extra_height += ((self.verse_count as f64 + 0.8)
                * style.lyric_line_space
                * style.drawing_unit(staff_size) as f64) as i32;
        }
        if self.dynam_below || self.dir_below {
            ctx.extra_height += style.drawing_dynam_height(staff_size);
        } else if self.hairpin_below {
            ctx.extra_height += style.drawing_hairpin_height(staff_size);
        }
    }

    /// Shift-integration step, the vertical twin of the horizontal one.
    pub fn integrate_y_shift(&mut self, shift: &mut i32) {
        self.y_rel += self.y_shift + *shift;
        *shift += self.y_shift;
        self.y_shift = 0;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SystemAligner
// ═══════════════════════════════════════════════════════════════════════

/// Owns and orders the staff alignments of one system.
///
/// Staff alignments are created in the order the staves are encountered;
/// requesting an index with a gap is a caller contract violation. The
/// bottom sentinel represents the system's bottom margin: it is always
/// last, never reachable by staff lookup, and participates in both
/// vertical passes like any staff.
#[derive(Debug)]
pub struct SystemAligner {
    staves: Vec<StaffAlignment>,
    bottom: StaffAlignment,
}

impl Default for SystemAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemAligner {
    pub fn new() -> Self {
        Self { staves: Vec::new(), bottom: StaffAlignment::new(None) }
    }

    /// Drop all staff alignments, keeping a fresh bottom sentinel.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn staff_alignment_count(&self) -> usize {
        self.staves.len()
    }

    /// The staff alignments in top-to-bottom order, without the sentinel.
    pub fn staff_alignments(&self) -> &[StaffAlignment] {
        &self.staves
    }

    /// The bottom-margin sentinel, always last.
    pub fn bottom_alignment(&self) -> &StaffAlignment {
        &self.bottom
    }

    /// The alignment at `index`, creating it for `staff` when `index` is
    /// the next free slot. Indices must arrive gap-free, in staff order.
    pub fn get_staff_alignment(&mut self, index: usize, staff: &StaffDef) -> &mut StaffAlignment {
        if index < self.staves.len() {
            return &mut self.staves[index];
        }
        debug_assert_eq!(
            index,
            self.staves.len(),
            "staff alignment {} requested but only {} exist",
            index,
            self.staves.len()
        );
        self.staves.push(StaffAlignment::new(Some(staff.clone())));
        let last = self.staves.len() - 1;
        &mut self.staves[last]
    }

    /// The alignment for staff number `staff_n`, if one was registered.
    /// A miss is not an error; callers fall back to skipping the element.
    pub fn get_staff_alignment_for_staff_n(&self, staff_n: i32) -> Option<&StaffAlignment> {
        let found = self
            .staves
            .iter()
            .find(|a| a.staff().map_or(false, |s| s.n == staff_n));
        if found.is_none() {
            log::debug!("staff alignment for staff {staff_n} not found");
        }
        found
    }

    /// Mutable variant of
    /// [`get_staff_alignment_for_staff_n`](Self::get_staff_alignment_for_staff_n).
    pub fn get_staff_alignment_for_staff_n_mut(
        &mut self,
        staff_n: i32,
    ) -> Option<&mut StaffAlignment> {
        let found = self
            .staves
            .iter_mut()
            .find(|a| a.staff().map_or(false, |s| s.n == staff_n));
        if found.is_none() {
            log::debug!("staff alignment for staff {staff_n} not found");
        }
        found
    }

    /// Vertical spacing pass, top to bottom, sentinel last.
    pub fn set_alignment_y_pos(&mut self, ctx: &mut VerticalSpacingContext, style: &Style) {
        for alignment in &mut self.staves {
            alignment.set_alignment_y_pos(ctx, style);
        }
        self.bottom.set_alignment_y_pos(ctx, style);
    }

    /// Y-shift integration pass, top to bottom, sentinel last.
    pub fn integrate_y_shift(&mut self) {
        let mut shift = 0;
        for alignment in &mut self.staves {
            alignment.integrate_y_shift(&mut shift);
        }
        self.bottom.integrate_y_shift(&mut shift);
    }

    /// Total height of the system: how far the bottom margin ended up.
    pub fn height(&self) -> i32 {
        -self.bottom.y_rel()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════
