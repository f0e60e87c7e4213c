//! Sample Record Parsing

/// Marker character that prefixes a CO2 reading line
pub const SAMPLE_MARKER: char = 'Z';

/// Extract the reading from a `Z <value>` record.
///
/// The marker is matched case-insensitively and may be followed by one
/// optional space. Only the leading integer is read, so streaming records
/// that carry a second field (`Z 00421 z 00410`) yield the first value.
/// Returns `None` for any other line, including lines that are not UTF-8.
pub fn parse_sample(line: &[u8]) -> Option<i32> {
    let line = std::str::from_utf8(line).ok()?;
    let mut chars = line.chars();
    let marker = chars.next()?;
    if !marker.eq_ignore_ascii_case(&SAMPLE_MARKER) {
        return None;
    }

    let rest = chars.as_str();
    let rest = rest.strip_prefix(' ').unwrap_or(rest);

    let end = rest
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    rest[..end].parse().ok()
}
