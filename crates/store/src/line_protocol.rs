//! Line-protocol encoding for write batches.
//!
//! One line per point: `measurement,tag=v field=1.0 <ns-timestamp>`.
//! Measurement names escape commas and spaces; tag and field keys and
//! tag values additionally escape `=`.

use econ_pulse_core::Point;
use std::fmt::Write as _;

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_key_or_tag(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

/// Encodes one point as a single line-protocol line.
#[must_use]
pub fn encode_point(point: &Point) -> String {
    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        let _ = write!(
            line,
            ",{}={}",
            escape_key_or_tag(key),
            escape_key_or_tag(value)
        );
    }

    line.push(' ');
    let mut first = true;
    for (key, value) in &point.fields {
        if !first {
            line.push(',');
        }
        first = false;
        let _ = write!(line, "{}={}", escape_key_or_tag(key), value);
    }

    let ns = point.timestamp.timestamp_nanos_opt().unwrap_or_default();
    let _ = write!(line, " {ns}");
    line
}

/// Encodes a batch of points, one line each, newline separated.
#[must_use]
pub fn encode_batch(points: &[Point]) -> String {
    points
        .iter()
        .map(encode_point)
        .collect::<Vec<_>>()
        .join("\n")
}
