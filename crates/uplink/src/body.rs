//! Plain-text batch encoding

use std::fmt::Write;

/// Record marker understood by the collector
pub const BODY_MARKER: char = 'Z';

/// Encode samples as `Z <value>` lines, each terminated by `\n`
pub fn encode_body(samples: &[i32]) -> String {
    let mut body = String::with_capacity(samples.len() * 8);
    for sample in samples {
        // Writing to a String cannot fail
        let _ = writeln!(body, "{} {}", BODY_MARKER, sample);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_batch() {
        let samples = [100, 102, 98, 105, 110, 90, 95, 100, 100, 100];
        let body = encode_body(&samples);

        assert_eq!(
            body,
            "Z 100\nZ 102\nZ 98\nZ 105\nZ 110\nZ 90\nZ 95\nZ 100\nZ 100\nZ 100\n"
        );
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 10);
        for (line, sample) in lines.iter().zip(samples) {
            assert_eq!(*line, format!("Z {}", sample));
        }
    }

    #[test]
    fn test_negative_and_empty() {
        assert_eq!(encode_body(&[-3]), "Z -3\n");
        assert_eq!(encode_body(&[]), "");
    }
}
