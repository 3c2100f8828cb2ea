// ONE_EM constant used to go between "em" units used in style spec and "points" used internally for layout.
pub const ONE_EM: f64 = 24.0;

/// Zoom level at which `text-size` is evaluated for line anchor spacing, so anchors do not move
/// while zooming.
pub const MAX_TEXT_SIZE_ZOOM: f64 = 18.0;

/// Precision for the pole of inaccessibility of polygon labels. 16 tile units represent 2 pixels.
pub const POLE_OF_INACCESSIBILITY_PRECISION: f64 = 16.0;
