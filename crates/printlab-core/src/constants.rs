//! Shared constants.

/// Millimeters per inch, the bridge between physical and pixel space.
pub const MM_PER_INCH: f64 = 25.4;

/// Default resolution for interactive on-screen previews.
pub const PREVIEW_DPI: f64 = 96.0;

/// Default resolution for print-quality export.
pub const PRINT_DPI: f64 = 300.0;

/// Default bound on the history snapshot stack.
pub const HISTORY_CAPACITY: usize = 64;

/// Gap between the trim boundary and the inner end of a crop mark, in mm.
pub const CROP_MARK_GAP_MM: f64 = 2.0;

/// Length of a crop mark segment, in mm.
pub const CROP_MARK_LEN_MM: f64 = 5.0;
