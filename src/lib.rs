//! alignlib — measure and system alignment engine for score layout.
//!
//! Computes the two-dimensional layout of one system of music: horizontal
//! placement of events within each measure (spacing proportional to
//! rhythmic duration, justified to a target width) and vertical stacking
//! of staves (with room reserved for dynamics, directives, hairpins, and
//! lyric verses). Parsing, glyph drawing, and pagination live in the
//! surrounding application; this crate turns musical content into resolved
//! positions.
//!
//! # Example
//! ```
//! use alignlib::{layout_system, DurationClass, Event, Layer, Measure,
//!                MeasureStaff, StaffDef, Style, System};
//!
//! let mut system = System::new(vec![StaffDef::standard(1)]);
//! system.measures.push(Measure {
//!     staves: vec![MeasureStaff {
//!         layers: vec![Layer::from_events(vec![
//!             Event::note(DurationClass::Quarter),
//!             Event::note(DurationClass::Quarter),
//!         ])],
//!         ..MeasureStaff::empty()
//!     }],
//! });
//!
//! let layout = layout_system(&system, &Style::default(), None);
//! assert_eq!(layout.measures.len(), 1);
//! ```

pub mod aligner;
pub mod model;
pub mod style;

pub use aligner::{layout_system, SystemLayout};
pub use model::*;
pub use style::Style;

/// Serialize a resolved layout to a JSON string.
/// Useful for passing positions across process or language boundaries.
pub fn layout_to_json(layout: &SystemLayout) -> Result<String, String> {
    serde_json::to_string_pretty(layout).map_err(|e| format!("JSON serialization error: {e}"))
}

/// Lay out a system and serialize the result in one step.
///
/// `justify_width` stretches (or compresses) the system to the given
/// width. Pass `None` to keep the natural width.
pub fn layout_system_to_json(
    system: &System,
    style: &Style,
    justify_width: Option<i32>,
) -> Result<String, String> {
    layout_to_json(&layout_system(system, style, justify_width))
}
