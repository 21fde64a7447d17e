//! # Literal Escaper
//!
//! Makes arbitrary text safe to splice between single quotes in a
//! generated query. Only seven bytes are rewritten; everything else,
//! including bytes that are not valid UTF-8, passes through untouched.

/// Escape sequence for `byte`, or `None` if it passes through as-is.
#[inline]
fn sequence_for(byte: u8) -> Option<&'static str> {
    match byte {
        0 => Some("\\0"),
        b'\n' => Some("\\n"),
        b'\r' => Some("\\r"),
        b'\\' => Some("\\\\"),
        b'\'' => Some("\\'"),
        b'"' => Some("\\\""),
        0x1a => Some("\\Z"),
        _ => None,
    }
}

/// Escape a text value for embedding in a single-quoted literal.
///
/// All escaped characters are ASCII, so the output is valid UTF-8
/// whenever the input is.
pub fn escape(text: &str) -> String {
    String::from_utf8_lossy(&escape_bytes(text.as_bytes())).into_owned()
}

/// Escape raw bytes. Total over every byte sequence; [`escape`] is this
/// applied to a string's bytes.
pub fn escape_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match sequence_for(b) {
            Some(seq) => out.extend_from_slice(seq.as_bytes()),
            None => out.push(b),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of the query language's backslash escapes, for round-trip checks.
    fn unescape(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut iter = bytes.iter().copied();
        while let Some(b) = iter.next() {
            if b != b'\\' {
                out.push(b);
                continue;
            }
            match iter.next() {
                Some(b'0') => out.push(0),
                Some(b'n') => out.push(b'\n'),
                Some(b'r') => out.push(b'\r'),
                Some(b'Z') => out.push(0x1a),
                Some(other) => out.push(other),
                None => out.push(b'\\'),
            }
        }
        out
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape("connection reset by peer"), "connection reset by peer");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_escapes_quotes_and_backslash() {
        assert_eq!(escape(r#"it's a "test" \o/"#), r#"it\'s a \"test\" \\o/"#);
    }

    #[test]
    fn test_escapes_control_characters() {
        assert_eq!(escape("a\0b\nc\rd\u{1a}e"), "a\\0b\\nc\\rd\\Ze");
    }

    #[test]
    fn test_multibyte_passes_through() {
        assert_eq!(escape("ошибка 'x'"), "ошибка \\'x\\'");
    }

    #[test]
    fn test_output_never_contains_bare_quote() {
        let escaped = escape("'; DROP TABLE logs; --");
        let bytes = escaped.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'\'' {
                assert_eq!(bytes[i - 1], b'\\');
            }
        }
    }

    #[test]
    fn test_round_trip_through_unescape() {
        let samples: [&[u8]; 5] = [
            b"plain",
            b"quote ' and \" and \\",
            b"\0\n\r\x1a",
            b"\xff\xfe invalid utf-8 \x80",
            b"trailing backslash \\",
        ];
        for sample in samples {
            assert_eq!(unescape(&escape_bytes(sample)), sample);
        }
    }

    #[test]
    fn test_str_and_bytes_agree() {
        let text = "mixed \"q\" 'q' \\ \n ok";
        assert_eq!(escape(text).as_bytes(), escape_bytes(text.as_bytes()).as_slice());
    }
}
