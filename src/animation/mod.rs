/// Easing curves and smoothing.
pub mod ease;
