/// Format a seconds offset as `HH:MM:SS.mmm`.
///
/// Every component is truncated, never rounded, so `59.9995` renders as
/// `00:00:59.999`. Negative and NaN offsets are clamped to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_nan() || seconds < 0.0 { 0.0 } else { seconds };

    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds % 1.0) * 1000.0).floor() as u64;

    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}
