//! Shared numeric rounding/clamping helpers.
//!
//! Emitted scores round to 2 decimals and percentages to 1 decimal
//! everywhere in the crate; indexes clamp into `0..=100`.

/// Round to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 1 decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round and clamp into the `0..=100` index range.
///
/// Non-finite values degrade to 0.
pub(crate) fn clamp_index(value: f64) -> u32 {
    if !value.is_finite() || value < 0.0 {
        return 0;
    }
    if value > 100.0 {
        return 100;
    }
    value.round() as u32
}
