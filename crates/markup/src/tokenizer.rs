//! Inline-markup tokenizer for typed strings.
//!
//! Handles the subset of HTML that typed strings use: start/end tags with attributes,
//! self-closing tags, entities, and declarations (`<!...>`) which are skipped.
//! Tag/attribute names are ASCII `[A-Za-z0-9:_-]` and are lowercased.
//!
//! A `<` that does not open a tag (e.g. `1 < 2`) stays literal text.
use crate::entities::decode_entities;
use crate::types::{Attributes, Token};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Remove `<!-- ... -->` comments. An unterminated comment swallows the rest of the input.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(COMMENT_START) {
        out.push_str(&rest[..start]);
        let body = &rest[start + COMMENT_START.len()..];
        match body.find(COMMENT_END) {
            Some(end) => rest = &body[end + COMMENT_END.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Does the `<` at `i` open markup (tag, end tag, or declaration)?
fn opens_markup(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i + 1) {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'/') => bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()),
        Some(b'!') => true,
        _ => false,
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    let flush_text = |text: &mut String, out: &mut Vec<Token>| {
        if !text.is_empty() {
            out.push(Token::Text(decode_entities(text)));
            text.clear();
        }
    };

    // Slice endpoints are always ASCII structural bytes, so they stay on UTF-8 boundaries.
    while i < len {
        let next_lt = memchr(b'<', &bytes[i..]).map(|rel| i + rel);
        let Some(lt) = next_lt else {
            text.push_str(&input[i..]);
            break;
        };
        text.push_str(&input[i..lt]);
        if !opens_markup(bytes, lt) {
            text.push('<');
            i = lt + 1;
            continue;
        }
        flush_text(&mut text, &mut out);

        if bytes[lt + 1] == b'!' {
            // Declarations and stray comments never produce tokens.
            let skip_to = if input[lt..].starts_with(COMMENT_START) {
                input[lt + COMMENT_START.len()..]
                    .find(COMMENT_END)
                    .map(|end| lt + COMMENT_START.len() + end + COMMENT_END.len())
            } else {
                memchr(b'>', &bytes[lt..]).map(|rel| lt + rel + 1)
            };
            i = skip_to.unwrap_or(len);
            continue;
        }

        if bytes[lt + 1] == b'/' {
            let start = lt + 2;
            let mut j = start;
            while j < len && is_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            j = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel + 1);
            out.push(Token::EndTag(name));
            i = j;
            continue;
        }

        let (token, next) = start_tag(input, lt + 1);
        out.push(token);
        i = next;
    }

    flush_text(&mut text, &mut out);
    log::trace!(target: "typist.markup", "tokenized {} bytes into {} tokens", len, out.len());
    out
}

/// Parse a start tag whose name begins at `start`; returns the token and the index after `>`.
fn start_tag(input: &str, start: usize) -> (Token, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut k = start;
    while k < len && is_name_char(bytes[k]) {
        k += 1;
    }
    let name = input[start..k].to_ascii_lowercase();
    let mut attributes: Attributes = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        if bytes[k] == b'>' {
            k += 1;
            break;
        }
        if bytes[k] == b'/' {
            if bytes.get(k + 1) == Some(&b'>') {
                self_closing = true;
                k += 2;
                break;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            // Unsupported byte in attribute position; skip it (UTF-8 safe: advance a whole char).
            k += input[k..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        let attribute_name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                k = memchr(quote, &bytes[k..]).map_or(len, |rel| k + rel);
                let raw = &input[vstart..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let vstart = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[vstart..k]))
            }
        } else {
            None
        };
        attributes.push((attribute_name, value));
    }

    if is_void_element(&name) {
        self_closing = true;
    }

    (
        Token::StartTag {
            name,
            attributes,
            self_closing,
        },
        k,
    )
}
