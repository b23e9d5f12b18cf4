//! Display formatting for derived quote fields.

/// Format a percent change for display, two decimal places (`"1.25%"`).
///
/// Negative values keep their sign (`"-0.73%"`); no explicit `+` is added.
pub fn format_percent(change: f64) -> String {
    format!("{:.2}%", change)
}
