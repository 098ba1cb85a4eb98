//! Input model for the alignment engine.
//!
//! These structures describe the musical content of one system — staves,
//! measures, layers, events, and floating marks — in exactly the detail the
//! aligners need: onset order, rhythmic durations, and which annotations are
//! present. Pitch, glyph shapes, and document parsing live outside this
//! crate.

use serde::{Deserialize, Serialize};

/// One system of music: the staves it contains and its measures in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct System {
    /// Staff definitions, top to bottom
    pub staves: Vec<StaffDef>,
    /// Measures in left-to-right order
    pub measures: Vec<Measure>,
}

/// Definition of one staff within the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffDef {
    /// Staff number (1-based)
    pub n: i32,
    /// Number of staff lines (5 for modern notation)
    pub lines: i32,
    /// Staff size in percent (100 = full size)
    pub size: i32,
}

/// A single measure (bar) of music.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    /// Per-staff content, index-parallel with `System::staves`
    pub staves: Vec<MeasureStaff>,
}

/// The content of one staff within one measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureStaff {
    /// Voices/layers on this staff
    pub layers: Vec<Layer>,
    /// Dynamics, directives, and hairpins attached to this staff
    pub marks: Vec<FloatingMark>,
    /// Number of lyric verses under this staff (0 = no lyrics)
    pub verse_count: i32,
    /// How far content extends above the staff top line (≥ 0, reported by
    /// the glyph-measurement collaborator)
    pub overflow_above: i32,
    /// How far content extends below the staff bottom line (≥ 0)
    pub overflow_below: i32,
}

/// One voice within a staff/measure.
///
/// The four leading attribute slots hold the clef/key/mensuration/meter
/// signatures to be drawn at the start of the measure, when the surrounding
/// score definition requires them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub clef: Option<Clef>,
    pub key_sig: Option<KeySig>,
    pub mensur: Option<Mensur>,
    pub meter_sig: Option<MeterSig>,
    /// Notes and rests in voice order
    pub events: Vec<Event>,
}

/// Clef signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clef {
    /// Clef sign: "G", "F", "C"
    pub sign: String,
    /// Staff line the clef sits on
    pub line: i32,
}

/// Key signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySig {
    /// Number of sharps (positive) or flats (negative)
    pub fifths: i32,
}

/// Mensuration sign (mensural notation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mensur {
    /// Sign: "C" or "O"
    pub sign: String,
    /// Whether the sign is slashed
    pub slash: bool,
}

/// Meter signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterSig {
    /// Numerator (e.g., 3 in 3/4)
    pub count: i32,
    /// Denominator (e.g., 4 in 3/4)
    pub unit: i32,
}

/// A single note or rest.
///
/// Onset times are not stored: the layout driver accumulates them from the
/// durations, and chord tones and grace notes do not advance the cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Rhythmic duration class
    pub dur: DurationClass,
    /// Whether the duration is dotted (×1.5)
    pub dot: bool,
    /// Whether this is a rest
    pub rest: bool,
    /// Whether this event sounds together with the previous one
    pub chord: bool,
    /// Whether this is a grace note (no metrical duration)
    pub grace: bool,
    /// Whether this is a whole-measure rest
    pub full_measure: bool,
    /// Whether a whole-measure rest is drawn at double width
    /// (multi-measure rest numeral)
    pub double_width: bool,
}

impl Event {
    /// A plain note of the given duration.
    pub fn note(dur: DurationClass) -> Self {
        Self {
            dur,
            dot: false,
            rest: false,
            chord: false,
            grace: false,
            full_measure: false,
            double_width: false,
        }
    }

    /// A rest of the given duration.
    pub fn rest(dur: DurationClass) -> Self {
        Self { rest: true, ..Self::note(dur) }
    }

    /// A grace note of the given duration.
    pub fn grace(dur: DurationClass) -> Self {
        Self { grace: true, ..Self::note(dur) }
    }

    /// Duration in quarter-note units, including the dot.
    pub fn duration_units(&self) -> f64 {
        let base = self.dur.quarter_units();
        if self.dot {
            base * 1.5
        } else {
            base
        }
    }
}

/// Rhythmic duration classes, longest first.
///
/// The ordering is significant: `Maxima < Long < Breve < Whole < …`, so the
/// longest duration in a measure is the minimum of its events' classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DurationClass {
    Maxima,
    Long,
    Breve,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl DurationClass {
    /// Duration in quarter-note units (whole note = 4).
    pub fn quarter_units(self) -> f64 {
        match self {
            DurationClass::Maxima => 32.0,
            DurationClass::Long => 16.0,
            DurationClass::Breve => 8.0,
            DurationClass::Whole => 4.0,
            DurationClass::Half => 2.0,
            DurationClass::Quarter => 1.0,
            DurationClass::Eighth => 0.5,
            DurationClass::Sixteenth => 0.25,
            DurationClass::ThirtySecond => 0.125,
            DurationClass::SixtyFourth => 0.0625,
        }
    }

    /// Number of halvings relative to the semibreve (whole = 0, half = 1,
    /// breve = −1, …). Used by the spacing rescale for very long notes.
    pub fn halvings_from_whole(self) -> i32 {
        self as i32 - DurationClass::Whole as i32
    }
}

/// Kinds of floating marks that reserve vertical space around a staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkKind {
    /// A text directive ("dolce", "rit.")
    Directive,
    /// A dynamic marking ("p", "ff")
    Dynamic,
    /// A crescendo/decrescendo wedge
    Hairpin,
}

/// Placement of a floating mark relative to its staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Place {
    Above,
    Below,
}

/// What a floating mark is attached to horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarkAnchor {
    /// Anchored to the event column at this musical time
    Event(f64),
    /// Anchored by abstract timestamp (1.0 = first beat; values below 1.0
    /// fall before the measure)
    Timestamp(f64),
}

/// A floating element (dynamic, directive, hairpin) attached to a staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingMark {
    /// Identity of the mark, unique within the system
    pub id: u32,
    pub kind: MarkKind,
    pub place: Place,
    pub anchor: MarkAnchor,
}

impl System {
    /// Create a system with the given staves and no measures.
    pub fn new(staves: Vec<StaffDef>) -> Self {
        Self { staves, measures: Vec::new() }
    }
}

impl StaffDef {
    /// A standard five-line staff at full size.
    pub fn standard(n: i32) -> Self {
        Self { n, lines: 5, size: 100 }
    }
}

impl MeasureStaff {
    /// An empty staff-measure with no layers or marks.
    pub fn empty() -> Self {
        Self {
            layers: Vec::new(),
            marks: Vec::new(),
            verse_count: 0,
            overflow_above: 0,
            overflow_below: 0,
        }
    }
}

impl Layer {
    /// A layer with events only, no leading attribute signatures.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { clef: None, key_sig: None, mensur: None, meter_sig: None, events }
    }
}
