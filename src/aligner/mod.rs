//! The alignment engine — accumulator objects for the two dimensions of
//! score layout, plus the driver that runs the pass pipeline over them.
//!
//! Horizontally, a [`MeasureAligner`] owns one column per musical time
//! point in a measure; vertically, a [`SystemAligner`] owns one record per
//! staff in a system. Both follow the same scheme: content registration
//! accumulates monotone requirements (widths, shifts, heights, flags), and
//! position resolution runs as full passes in a fixed order — spacing,
//! shift integration, justification. Partial results are meaningless; a
//! relayout resets the aligners and rebuilds them from scratch.

mod horizontal;
mod layout;
mod timestamp;
mod vertical;

pub use horizontal::{
    horizontal_space_for_duration, Alignment, AlignmentType, GraceAligner,
    HorizontalSpacingContext, JustificationContext, MeasureAligner, XShiftIntegrationContext,
};
pub use layout::{
    layout_system, ColumnLayout, GraceColumnLayout, GraceLayout, MarkPosition, MeasureLayout,
    StaffPosition, SystemLayout,
};
pub use timestamp::{TimestampAligner, TimestampAttr};
pub use vertical::{
    FloatingBoundingBox, StaffAlignment, SystemAligner, VerticalSpacingContext,
};
