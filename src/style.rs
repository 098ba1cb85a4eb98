//! Style and glyph-metrics provider — every size the aligners consume.
//!
//! All lengths are in internal layout units. Sizes that depend on the staff
//! size take it in percent (100 = full size) and scale linearly, so a cue
//! staff at 60 gets 60% of every distance.

use serde::{Deserialize, Serialize};

/// Tolerance for comparing musical time positions.
pub const TIME_EPSILON: f64 = 0.001;

/// Tunable layout parameters plus fixed glyph footprints.
///
/// The defaults produce conventional engraving proportions; tests and
/// embedders override individual fields as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    /// Half the distance between two staff lines, at staff size 100
    pub unit: i32,
    /// Space between staves, in drawing units
    pub spacing_staff: i32,
    /// Linear spacing factor (larger = wider measures)
    pub spacing_linear: f64,
    /// Non-linear spacing exponent (1.0 = strictly proportional to duration)
    pub spacing_non_linear: f64,
    /// Minimum measure width, in drawing units
    pub min_measure_width: i32,
    /// Offset of the first column from the barline, in drawing units
    pub left_position: f64,
    /// Height of one lyric verse line, in drawing units
    pub lyric_line_space: f64,
    /// Height reserved for a dynamic or directive, in drawing units
    pub dynam_height: f64,
    /// Height reserved for a hairpin, in drawing units
    pub hairpin_height: f64,
    /// Scale factor between duration-spacing units and layout units
    pub definition_factor: i32,

    // ── Fixed glyph footprints (layout units at staff size 100) ─────
    /// Horizontal space for a clef
    pub clef_width: i32,
    /// Horizontal space per key-signature accidental
    pub key_sig_accid_width: i32,
    /// Horizontal space for a mensuration sign
    pub mensur_width: i32,
    /// Horizontal space for a meter signature
    pub meter_sig_width: i32,
    /// Horizontal space for a notehead with accidental clearance
    pub note_width: i32,
    /// Horizontal space per grace note — roughly 66% of a normal notehead
    pub grace_note_width: i32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            unit: 9,
            spacing_staff: 8,
            spacing_linear: 0.25,
            spacing_non_linear: 0.6,
            min_measure_width: 15,
            left_position: 0.8,
            lyric_line_space: 0.6,
            dynam_height: 2.5,
            hairpin_height: 1.8,
            definition_factor: 9,
            clef_width: 32,
            key_sig_accid_width: 9,
            mensur_width: 20,
            meter_sig_width: 24,
            note_width: 14,
            grace_note_width: 9,
        }
    }
}

impl Style {
    /// Drawing unit at the given staff size.
    pub fn drawing_unit(&self, staff_size: i32) -> i32 {
        self.unit * staff_size / 100
    }

    /// Distance between two staff lines at the given staff size.
    pub fn drawing_double_unit(&self, staff_size: i32) -> i32 {
        2 * self.unit * staff_size / 100
    }

    /// Height reserved for a dynamic or directive at the given staff size.
    pub fn drawing_dynam_height(&self, staff_size: i32) -> i32 {
        (self.dynam_height * self.drawing_unit(staff_size) as f64) as i32
    }

    /// Height reserved for a hairpin at the given staff size.
    pub fn drawing_hairpin_height(&self, staff_size: i32) -> i32 {
        (self.hairpin_height * self.drawing_unit(staff_size) as f64) as i32
    }

    /// Horizontal width of a key signature with the given number of fifths.
    pub fn key_sig_width(&self, fifths: i32) -> i32 {
        fifths.unsigned_abs() as i32 * self.key_sig_accid_width
    }

    /// Offset of the first column from the measure's left barline.
    pub fn left_offset(&self) -> i32 {
        (self.left_position * self.drawing_unit(100) as f64) as i32
    }

    /// Minimum measure width in layout units.
    pub fn min_measure_width_units(&self) -> i32 {
        self.min_measure_width * self.drawing_unit(100)
    }
}

/// Approximate equality for musical time positions. Time values come from
/// summed binary fractions, so exact float equality is not assumed.
pub fn times_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < TIME_EPSILON
}
