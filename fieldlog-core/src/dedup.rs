//! Duplicate-key collapsing over partially built record buffers.
//!
//! The engine operates on the raw bytes of an object's inner content (the
//! comma-separated `"key":value` entries a buffer holds, without the
//! enclosing braces) and never re-parses them into a value tree. Entries are
//! split at depth-0 commas, honoring quoted strings (including
//! backslash-escaped quotes) and nested braces/brackets, so the pass is
//! linear in buffer length per nesting level touched.
//!
//! Collapsing rule: each key is emitted once, at the position of its *first*
//! occurrence, carrying the value of its *last* occurrence; every other
//! occurrence is dropped. The shallow pass ([`dedup`]) applies the rule at
//! depth 0 only; the deep pass ([`dedup_deep`]) additionally recurses into
//! retained object values and into object elements of retained arrays.
//! Scalar array elements are never deduplicated against each other.
//!
//! Guarantees:
//! - an input with no duplicate keys is returned byte-identical
//! - both passes are idempotent
//! - output never has unbalanced nesting or a dangling comma
//!
//! This module only ever sees buffers the encoder itself produced; a
//! malformed buffer is an internal-invariant violation reported as
//! [`FieldlogError::MalformedBuffer`].

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{FieldlogError, FieldlogResult};

/// Which dedup pass a builder should run at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupMode {
    /// Leave duplicate keys as-is.
    #[default]
    Off,
    /// Collapse duplicates at the top level only.
    Shallow,
    /// Collapse duplicates at the top level and inside retained
    /// object/array values, recursively.
    Deep,
}

/// Collapses duplicate top-level keys (shallow pass).
pub fn dedup(input: &[u8]) -> FieldlogResult<Vec<u8>> {
    collapse(input, 0, false)
}

/// Collapses duplicate keys at every nesting depth (deep pass).
pub fn dedup_deep(input: &[u8]) -> FieldlogResult<Vec<u8>> {
    collapse(input, 0, true)
}

/// Runs the requested pass over an owned buffer.
///
/// A malformed buffer can only mean some other producer wrote into it:
/// development builds trip an assertion, release builds skip the rewrite and
/// pass the buffer through untouched.
pub(crate) fn apply(mode: DedupMode, buf: Vec<u8>) -> Vec<u8> {
    let result = match mode {
        DedupMode::Off => return buf,
        DedupMode::Shallow => dedup(&buf),
        DedupMode::Deep => dedup_deep(&buf),
    };
    match result {
        Ok(out) => out,
        Err(err) => {
            debug_assert!(false, "dedup pass skipped: {err}");
            buf
        }
    }
}

/// Splits object inner content (or array inner content) into depth-0 spans.
///
/// `offset` is the position of `input` within the original buffer, used only
/// for error reporting.
fn split_top_level(input: &[u8], offset: usize) -> FieldlogResult<Vec<Range<usize>>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0usize;

    for (i, &b) in input.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                if depth == 0 {
                    return Err(FieldlogError::malformed(
                        offset + i,
                        "unbalanced closing delimiter",
                    ));
                }
                depth -= 1;
            }
            b',' if depth == 0 => {
                if i == start {
                    return Err(FieldlogError::malformed(offset + i, "empty entry"));
                }
                spans.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_string {
        return Err(FieldlogError::malformed(
            offset + input.len(),
            "unterminated string",
        ));
    }
    if depth != 0 {
        return Err(FieldlogError::malformed(
            offset + input.len(),
            "unbalanced nesting",
        ));
    }
    if input.is_empty() {
        return Ok(spans);
    }
    if start == input.len() {
        return Err(FieldlogError::malformed(
            offset + input.len(),
            "dangling trailing comma",
        ));
    }
    spans.push(start..input.len());
    Ok(spans)
}

/// Splits one `"key":value` entry into its key bytes (escapes intact,
/// quotes excluded) and its value range.
fn split_key_value(
    input: &[u8],
    span: &Range<usize>,
    offset: usize,
) -> FieldlogResult<(Range<usize>, Range<usize>)> {
    if input.get(span.start) != Some(&b'"') {
        return Err(FieldlogError::malformed(
            offset + span.start,
            "entry does not start with a quoted key",
        ));
    }
    let mut escaped = false;
    let mut key_end = None;
    for i in span.start + 1..span.end {
        let b = input[i];
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            key_end = Some(i);
            break;
        }
    }
    let key_end = key_end
        .ok_or_else(|| FieldlogError::malformed(offset + span.end, "unterminated key"))?;
    if input.get(key_end + 1) != Some(&b':') {
        return Err(FieldlogError::malformed(
            offset + key_end + 1,
            "missing colon after key",
        ));
    }
    let value_start = key_end + 2;
    if value_start >= span.end {
        return Err(FieldlogError::malformed(offset + value_start, "empty value"));
    }
    Ok((span.start + 1..key_end, value_start..span.end))
}

/// Applies the collapsing rule to one object's inner content.
fn collapse(input: &[u8], offset: usize, deep: bool) -> FieldlogResult<Vec<u8>> {
    let spans = split_top_level(input, offset)?;

    // 1. Parse every entry and record, per key, the index of its latest
    //    occurrence; `order` keeps first-occurrence positions.
    let mut parsed: Vec<(Range<usize>, Range<usize>)> = Vec::with_capacity(spans.len());
    let mut latest: HashMap<&[u8], usize> = HashMap::with_capacity(spans.len());
    let mut order: Vec<usize> = Vec::with_capacity(spans.len());
    for (i, span) in spans.iter().enumerate() {
        let (key, value) = split_key_value(input, span, offset)?;
        let key_bytes = &input[key.clone()];
        if latest.insert(key_bytes, i).is_none() {
            order.push(i);
        }
        parsed.push((key, value));
    }

    // 2. Re-emit entries in first-occurrence order, substituting the latest
    //    value recorded for each key. Unique entries are copied verbatim, so
    //    a no-duplicate input reproduces its exact bytes.
    let mut out = Vec::with_capacity(input.len());
    for &first in &order {
        let key_bytes = &input[parsed[first].0.clone()];
        let winner = latest[key_bytes];
        let (_, value) = &parsed[winner];

        if !out.is_empty() {
            out.push(b',');
        }
        // `"key":` portion of the winning entry, verbatim.
        out.extend_from_slice(&input[spans[winner].start..value.start]);
        if deep {
            collapse_value(input, value, offset, &mut out)?;
        } else {
            out.extend_from_slice(&input[value.clone()]);
        }
    }
    Ok(out)
}

/// Deep-pass rewrite of one retained value.
///
/// Objects get the collapsing rule recursively; arrays recurse into object
/// elements only; scalars are copied verbatim.
fn collapse_value(
    input: &[u8],
    value: &Range<usize>,
    offset: usize,
    out: &mut Vec<u8>,
) -> FieldlogResult<()> {
    let bytes = &input[value.clone()];
    match (bytes.first(), bytes.last()) {
        (Some(b'{'), Some(b'}')) => {
            let inner = &input[value.start + 1..value.end - 1];
            let collapsed = collapse(inner, offset + value.start + 1, true)?;
            out.push(b'{');
            out.extend_from_slice(&collapsed);
            out.push(b'}');
        }
        (Some(b'['), Some(b']')) => {
            let inner = &input[value.start + 1..value.end - 1];
            let elements = split_top_level(inner, offset + value.start + 1)?;
            out.push(b'[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                let absolute = value.start + 1 + element.start..value.start + 1 + element.end;
                if inner[element.clone()].first() == Some(&b'{') {
                    collapse_value(input, &absolute, offset, out)?;
                } else {
                    out.extend_from_slice(&input[absolute]);
                }
            }
            out.push(b']');
        }
        _ => out.extend_from_slice(bytes),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shallow(s: &str) -> String {
        String::from_utf8(dedup(s.as_bytes()).unwrap()).unwrap()
    }

    fn deep(s: &str) -> String {
        String::from_utf8(dedup_deep(s.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_unique_keys_are_byte_identical() {
        let input = r#""a":1,"b":{"x":2},"c":[1,"two",{"y":3}]"#;
        assert_eq!(shallow(input), input);
        assert_eq!(deep(input), input);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(shallow(""), "");
        assert_eq!(deep(""), "");
    }

    #[test]
    fn test_last_value_wins_at_first_position() {
        assert_eq!(shallow(r#""foo":"bar","foo":"baz""#), r#""foo":"baz""#);
        assert_eq!(
            shallow(r#""a":1,"foo":"bar","b":2,"foo":"baz""#),
            r#""a":1,"foo":"baz","b":2"#
        );
    }

    #[test]
    fn test_idempotence() {
        let input = r#""foo":"bar","n":1,"foo":"baz","dict":{"k":1,"k":2}"#;
        let once = shallow(input);
        assert_eq!(shallow(&once), once);
        let once = deep(input);
        assert_eq!(deep(&once), once);
    }

    #[test]
    fn test_shallow_does_not_touch_nested_objects() {
        let input = r#""dict":{"k":1,"k":2}"#;
        assert_eq!(shallow(input), input);
    }

    #[test]
    fn test_deep_collapses_nested_objects() {
        assert_eq!(deep(r#""dict":{"k":1,"k":2}"#), r#""dict":{"k":2}"#);
        assert_eq!(
            deep(r#""a":{"b":{"k":1,"k":2}}"#),
            r#""a":{"b":{"k":2}}"#
        );
    }

    #[test]
    fn test_deep_recurses_into_array_objects_only() {
        // Object elements are collapsed; scalar elements are preserved even
        // when equal.
        assert_eq!(
            deep(r#""xs":["a",1,"a",{"k":1,"k":2}]"#),
            r#""xs":["a",1,"a",{"k":2}]"#
        );
    }

    #[test]
    fn test_duplicate_arrays_keep_last() {
        assert_eq!(
            deep(r#""xs":["bar",1,{"foo":"bar"}],"xs":["baz",1,{"foo":"baz","foo":"bam"}]"#),
            r#""xs":["baz",1,{"foo":"bam"}]"#
        );
    }

    #[test]
    fn test_separators_inside_strings_do_not_split() {
        let input = r#""a":"x,y:z}","b":"{[","a":"w""#;
        assert_eq!(shallow(input), r#""a":"w","b":"{[""#);
    }

    #[test]
    fn test_escaped_quotes_in_keys_and_values() {
        let input = r#""a\"b":1,"c":"he said \"hi\"","a\"b":2"#;
        assert_eq!(shallow(input), r#""a\"b":2,"c":"he said \"hi\"""#);
    }

    #[test]
    fn test_trailing_backslash_escape_state() {
        // The escape flag must reset after the escaped character, or the
        // closing quote here would be missed.
        let input = r#""p":"c:\\","p":"d:\\""#;
        assert_eq!(shallow(input), r#""p":"d:\\""#);
    }

    #[test]
    fn test_malformed_inputs_report_offsets() {
        let cases: &[(&str, &str)] = &[
            (r#""a":1,"#, "dangling trailing comma"),
            (r#""a":1,,"b":2"#, "empty entry"),
            (r#""a":{"#, "unbalanced nesting"),
            (r#""a":1}"#, "unbalanced closing delimiter"),
            (r#""a":"unterminated"#, "unterminated string"),
            (r#"a:1"#, "entry does not start with a quoted key"),
            (r#""a"1"#, "missing colon after key"),
            (r#""a":"#, "empty value"),
        ];
        for (input, needle) in cases {
            let err = dedup(input.as_bytes()).unwrap_err();
            let msg = err.to_string();
            assert!(
                msg.contains(needle),
                "input {input:?}: expected {needle:?} in {msg:?}"
            );
            assert!(err.offset().is_some());
        }
    }

    #[test]
    fn test_output_stays_balanced() {
        let out = deep(r#""a":{"k":[1,2],"k":{"x":1}},"a":{"k":"v","k":[3]}"#);
        assert_eq!(out, r#""a":{"k":[3]}"#);
    }

    #[test]
    fn test_apply_off_is_identity() {
        let buf = br#""a":1"#.to_vec();
        assert_eq!(apply(DedupMode::Off, buf.clone()), buf);
    }
}
