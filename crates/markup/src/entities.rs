use memchr::memchr;

/// Decode the small entity set that typed strings realistically carry.
///
/// Contract:
/// - Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// - Numeric: `&#123;` and `&#x1F4A9;`, semicolon-terminated, valid scalar values only.
/// - Anything else (unknown names, missing `;`, overlong digit runs) passes through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;

    while let Some(rel) = memchr(b'&', &bytes[i..]) {
        let amp = i + rel;
        out.push_str(&s[copy_start..amp]);

        match resolve_at(s, amp) {
            Some((ch, consumed)) => {
                out.push(ch);
                i = amp + consumed;
            }
            None => {
                out.push('&');
                i = amp + 1;
            }
        }
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}

// Longest accepted body is `#x10FFFF` / `#1114111`.
const MAX_BODY_LEN: usize = 8;
const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

/// Returns the decoded char and the number of bytes consumed (including `&` and `;`).
fn resolve_at(s: &str, amp: usize) -> Option<(char, usize)> {
    let bytes = s.as_bytes();
    let body_start = amp + 1;
    let window_end = (body_start + MAX_BODY_LEN + 1).min(bytes.len());
    let semi = body_start + memchr(b';', &bytes[body_start..window_end])?;
    // Only ASCII bytes are accepted below, so slicing at `semi` is a char boundary.
    let body = bytes.get(body_start..semi)?;
    if body.is_empty() || !body.is_ascii() {
        return None;
    }
    let body = &s[body_start..semi];
    let consumed = semi + 1 - amp;

    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        _ => numeric(body)?,
    };
    Some((ch, consumed))
}

fn numeric(body: &str) -> Option<char> {
    let rest = body.strip_prefix('#')?;
    let (digits, radix, max) = match rest.strip_prefix(|c: char| c == 'x' || c == 'X') {
        Some(hex) => (hex, 16, MAX_HEX_DIGITS),
        None => (rest, 10, MAX_DEC_DIGITS),
    };
    if digits.is_empty() || digits.len() > max {
        return None;
    }
    if !digits.bytes().all(|b| (b as char).is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("&quot;hi&quot; &apos;yo&apos;"), "\"hi\" 'yo'");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;"), "×");
        assert_eq!(decode_entities("&#X1F600;"), "\u{1F600}");
    }

    #[test]
    fn leaves_malformed_sequences_alone() {
        for raw in [
            "&",
            "&;",
            "&#;",
            "&#x;",
            "&amp",
            "loose &amp space",
            "&notanentity;",
            "&#xD800;",
            "&#x110000;",
            "&#11141111;",
            "&#12a;",
        ] {
            assert_eq!(decode_entities(raw), raw, "input: {raw:?}");
        }
    }

    #[test]
    fn malformed_entity_does_not_swallow_following_one() {
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
    }

    #[test]
    fn preserves_utf8_around_entities() {
        assert_eq!(decode_entities("π &amp; σ"), "π & σ");
        assert_eq!(decode_entities("café&#33;"), "café!");
    }
}
