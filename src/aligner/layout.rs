//! Layout driver — walks the input model, feeds the aligners, and runs the
//! pass pipeline in its fixed order.
//!
//! The aligners themselves never see the document: this module is the
//! traversal that registers content into them (columns, grace stacks, staff
//! flags, bounding boxes) and then resolves positions measure by measure
//! and staff by staff. The result is a plain serializable structure the
//! rendering side can consume without touching the aligners.

use serde::Serialize;

use crate::model::{DurationClass, Layer, MarkAnchor, Measure, System};
use crate::style::Style;

use super::horizontal::{
    Alignment, AlignmentType, GraceAligner, HorizontalSpacingContext, JustificationContext,
    MeasureAligner, XShiftIntegrationContext,
};
use super::timestamp::TimestampAligner;
use super::vertical::{SystemAligner, VerticalSpacingContext};

/// Attribute signatures align with the start sentinel's time and sort
/// after it by column kind, before any event at time 0.
const ATTRIBUTE_POSITION: f64 = -1.0;

// ═══════════════════════════════════════════════════════════════════════
// Layout result structures
// ═══════════════════════════════════════════════════════════════════════

/// Resolved layout of one system — the full export surface.
#[derive(Debug, Clone, Serialize)]
pub struct SystemLayout {
    /// Total width of the system
    pub width: i32,
    /// Total height of the system (bottom margin included)
    pub height: i32,
    pub measures: Vec<MeasureLayout>,
    pub staves: Vec<StaffPosition>,
}

/// Resolved layout of one measure.
#[derive(Debug, Clone, Serialize)]
pub struct MeasureLayout {
    /// Left edge of the measure within the system
    pub x: i32,
    /// Width after justification
    pub width: i32,
    /// Width before justification
    pub natural_width: i32,
    /// X-extent of the leading attribute region, excluded from
    /// justification
    pub non_justifiable_margin: i32,
    /// Every column including the start/end sentinels, in layout order
    pub columns: Vec<ColumnLayout>,
    /// Adjusted positions registered through the timestamp aligner
    pub timestamps: Vec<f64>,
}

/// Resolved position of one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnLayout {
    pub time: f64,
    pub kind: AlignmentType,
    /// Position relative to the measure's left edge
    pub x: i32,
    /// Widest element registered at this column
    pub width: i32,
    /// The grace run attached to this column, if any
    pub grace: Option<GraceLayout>,
}

/// Resolved layout of a grace run.
#[derive(Debug, Clone, Serialize)]
pub struct GraceLayout {
    /// Width of the whole run; the run ends at its main column
    pub total_width: i32,
    pub columns: Vec<GraceColumnLayout>,
}

/// Resolved position of one grace column, relative to the run's origin.
#[derive(Debug, Clone, Serialize)]
pub struct GraceColumnLayout {
    /// Musical time, negative (backward from the main note)
    pub time: f64,
    pub x: i32,
    pub width: i32,
}

/// Resolved vertical position of one staff.
#[derive(Debug, Clone, Serialize)]
pub struct StaffPosition {
    /// Staff number
    pub n: i32,
    /// Offset from the system top (≤ 0, downward)
    pub y: i32,
    /// Accumulated lyric verse count (0 = no lyrics anywhere)
    pub verse_count: i32,
    /// Resolved floating marks on this staff
    pub marks: Vec<MarkPosition>,
}

/// Resolved horizontal anchor of one floating mark.
#[derive(Debug, Clone, Serialize)]
pub struct MarkPosition {
    pub id: u32,
    /// X within the system
    pub x: i32,
}

// ═══════════════════════════════════════════════════════════════════════
// Driver
// ═══════════════════════════════════════════════════════════════════════

/// Lay out one system: horizontal spacing per measure, optional
/// justification to `justify_width`, then vertical staff stacking.
pub fn layout_system(system: &System, style: &Style, justify_width: Option<i32>) -> SystemLayout {
    // ── Horizontal: register and resolve each measure ───────────────
    let mut measure_aligners: Vec<MeasureAligner> = Vec::with_capacity(system.measures.len());
    let mut timestamp_aligners: Vec<TimestampAligner> =
        Vec::with_capacity(system.measures.len());

    for measure in &system.measures {
        debug_assert_eq!(
            measure.staves.len(),
            system.staves.len(),
            "measure content must cover every staff of the system"
        );

        let mut aligner = MeasureAligner::new();
        let longest = longest_duration(measure);

        for measure_staff in &measure.staves {
            for layer in &measure_staff.layers {
                align_layer(layer, &mut aligner, style);
            }
        }
        aligner.align_grace_stacks();

        let mut spacing = HorizontalSpacingContext::new(longest);
        aligner.set_alignment_x_pos(&mut spacing, style);
        aligner.integrate_grace_x_shift();
        let mut integration = XShiftIntegrationContext::default();
        aligner.integrate_x_shift(&mut integration, style);

        let mut timestamps = TimestampAligner::new();
        for measure_staff in &measure.staves {
            for mark in &measure_staff.marks {
                if let MarkAnchor::Timestamp(ts) = mark.anchor {
                    timestamps.get_timestamp_at_time(ts);
                }
            }
        }

        measure_aligners.push(aligner);
        timestamp_aligners.push(timestamps);
    }

    let natural_widths: Vec<i32> = measure_aligners.iter().map(|a| a.width()).collect();
    let natural_total: i32 = natural_widths.iter().sum();

    // ── Justification to the target width, if requested ─────────────
    if let Some(target) = justify_width {
        if natural_total > 0 && target > 0 {
            let ratio = target as f64 / natural_total as f64;
            for aligner in &mut measure_aligners {
                let mut justification = JustificationContext::new(ratio);
                aligner.justify_x(&mut justification);
            }
        }
    }

    let mut measure_origins: Vec<i32> = Vec::with_capacity(measure_aligners.len());
    let mut x_cursor = 0;
    for aligner in &measure_aligners {
        measure_origins.push(x_cursor);
        x_cursor += aligner.width();
    }
    let system_width = x_cursor;

    // ── Vertical: register staves and marks, then resolve ───────────
    let mut system_aligner = SystemAligner::new();
    for (measure, (aligner, &measure_x)) in system
        .measures
        .iter()
        .zip(measure_aligners.iter().zip(measure_origins.iter()))
    {
        for (index, measure_staff) in measure.staves.iter().enumerate() {
            let staff_def = &system.staves[index];
            let alignment = system_aligner.get_staff_alignment(index, staff_def);

            if measure_staff.verse_count > 0 {
                alignment.set_verse_count(measure_staff.verse_count);
            }
            if measure_staff.overflow_above > 0 {
                alignment.set_y_shift(-measure_staff.overflow_above);
            }
            if measure_staff.overflow_below > 0 {
                alignment.set_max_height(-measure_staff.overflow_below);
            }
            for mark in &measure_staff.marks {
                alignment.register_mark(mark.kind, mark.place);
                let x = measure_x + mark_anchor_x(mark.anchor, aligner);
                alignment.set_current_bounding_box(mark.id, x);
            }
        }
    }

    let mut vertical = VerticalSpacingContext::new();
    system_aligner.set_alignment_y_pos(&mut vertical, style);
    system_aligner.integrate_y_shift();

    // ── Collect the export structure ────────────────────────────────
    let measures = measure_aligners
        .iter()
        .zip(timestamp_aligners.iter())
        .zip(natural_widths.iter().zip(measure_origins.iter()))
        .map(|((aligner, timestamps), (&natural_width, &x))| MeasureLayout {
            x,
            width: aligner.width(),
            natural_width,
            non_justifiable_margin: aligner.non_justifiable_margin(),
            columns: aligner.alignments().map(column_layout).collect(),
            timestamps: timestamps
                .timestamps()
                .iter()
                .map(|t| t.actual_dur_pos())
                .collect(),
        })
        .collect();

    let staves = system_aligner
        .staff_alignments()
        .iter()
        .map(|alignment| StaffPosition {
            n: alignment.staff().map_or(0, |s| s.n),
            y: alignment.y_rel(),
            verse_count: alignment.verse_count(),
            marks: alignment
                .bounding_boxes()
                .map(|(id, b)| MarkPosition { id, x: b.content_x1 })
                .collect(),
        })
        .collect();

    SystemLayout {
        width: system_width,
        height: system_aligner.height(),
        measures,
        staves,
    }
}

/// Register one layer's attribute signatures and events into the measure
/// aligner, accumulating onset times from the durations.
fn align_layer(layer: &Layer, aligner: &mut MeasureAligner, style: &Style) {
    if layer.clef.is_some() {
        register(aligner, ATTRIBUTE_POSITION, AlignmentType::ClefAttr, style.clef_width);
    }
    if let Some(key_sig) = &layer.key_sig {
        register(
            aligner,
            ATTRIBUTE_POSITION,
            AlignmentType::KeySigAttr,
            style.key_sig_width(key_sig.fifths),
        );
    }
    if layer.mensur.is_some() {
        register(aligner, ATTRIBUTE_POSITION, AlignmentType::MensurAttr, style.mensur_width);
    }
    if layer.meter_sig.is_some() {
        register(
            aligner,
            ATTRIBUTE_POSITION,
            AlignmentType::MeterSigAttr,
            style.meter_sig_width,
        );
    }

    let mut time = 0.0;
    let mut last_onset = 0.0;
    for event in &layer.events {
        if event.grace {
            // grace notes pile up at the current time and resolve backward
            // once the whole measure is registered
            let column = aligner.get_alignment_at_time(time, AlignmentType::Default);
            column
                .grace_aligner()
                .stack_note(event.duration_units(), style.grace_note_width);
            continue;
        }

        let onset = if event.chord { last_onset } else { time };
        let kind = if event.full_measure {
            if event.double_width {
                AlignmentType::FullMeasure2
            } else {
                AlignmentType::FullMeasure
            }
        } else {
            AlignmentType::Default
        };
        register(aligner, onset, kind, style.note_width);

        if !event.chord {
            last_onset = time;
            time += event.duration_units();
        }
    }
    aligner.set_max_time(time);
}

/// Reserve a column and bid the element's footprint into it.
fn register(aligner: &mut MeasureAligner, time: f64, kind: AlignmentType, width: i32) {
    let column = aligner.get_alignment_at_time(time, kind);
    column.set_max_width(width);
    column.set_x_shift(width);
}

/// Longest duration class in the measure, for the spacing rescale.
fn longest_duration(measure: &Measure) -> DurationClass {
    measure
        .staves
        .iter()
        .flat_map(|s| &s.layers)
        .flat_map(|l| &l.events)
        .filter(|e| !e.grace)
        .map(|e| e.dur)
        .min()
        .unwrap_or(DurationClass::Quarter)
}

/// Horizontal anchor of a mark within its measure. Event anchors follow
/// the column at the anchor time; timestamp anchors fall back to the
/// measure origin (their fine position is the drawing side's concern).
fn mark_anchor_x(anchor: MarkAnchor, aligner: &MeasureAligner) -> i32 {
    match anchor {
        MarkAnchor::Event(time) => aligner
            .find_alignment_at_time(time)
            .map_or(0, |column| column.x_rel()),
        MarkAnchor::Timestamp(_) => 0,
    }
}

fn column_layout(column: &Alignment) -> ColumnLayout {
    ColumnLayout {
        time: column.time(),
        kind: column.kind(),
        x: column.x_rel(),
        width: column.max_width(),
        grace: column.grace().map(grace_layout),
    }
}

fn grace_layout(grace: &GraceAligner) -> GraceLayout {
    GraceLayout {
        total_width: grace.total_width(),
        columns: grace
            .columns()
            .iter()
            .map(|column| GraceColumnLayout {
                time: column.time(),
                x: column.x_rel(),
                width: column.max_width(),
            })
            .collect(),
    }
}
