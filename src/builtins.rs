//! Built-in operations (§4.1): `identity`, `reverse`, `to_upper`, `to_lower`,
//! `concat`, `split`, `trim`, `replace`, `substring`, `repeat`, `pad_left`,
//! `pad_right`, `capitalize`, `title`.
//!
//! Every built-in is pure: its output depends only on `inputs` and
//! `constants`, with no hidden state — this is a testable property of the
//! engine (see `tests/integration_tests.rs`).
//!
//! # String semantics
//!
//! Strings are treated as byte sequences, not grapheme sequences, matching
//! the source this engine was distilled from. `reverse` and `substring`
//! operate on the raw byte vector and reassemble the result with
//! `String::from_utf8_lossy`, so reversing or slicing through the middle of
//! a multi-byte UTF-8 character replaces the mangled bytes with U+FFFD
//! rather than panicking. Case conversion (`to_upper`/`to_lower`) uses
//! `str::to_ascii_uppercase`/`to_ascii_lowercase`, which rewrite only ASCII
//! byte values and leave every other byte unchanged in place; `capitalize`/
//! `title` do the same rewrite by hand on the raw byte vector since they
//! need per-position case decisions. Non-ASCII bytes are never touched by
//! any of these four, so they never produce invalid UTF-8 and never widen a
//! non-ASCII byte into a multi-byte sequence.

use std::sync::Arc;

use crate::registry::{OpError, OperationExecutor, OperationKind, OperationRegistry, OutputArity};

type OpResult = std::result::Result<Vec<String>, OpError>;

fn reg(
    registry: &OperationRegistry,
    name: &str,
    output_arity: OutputArity,
    input_arity: usize,
    f: impl Fn(&[String], &[String]) -> OpResult + Send + Sync + 'static,
) {
    let executor: OperationExecutor = Arc::new(f);
    registry
        .register(name, executor, output_arity, input_arity, OperationKind::Native, false)
        .expect("builtin operation names must be unique");
}

/// Register every built-in into `registry`.
pub fn register_all(registry: &OperationRegistry) {
    reg(registry, "identity", OutputArity::Fixed(1), 1, |inputs, _| Ok(vec![inputs[0].clone()]));

    reg(registry, "reverse", OutputArity::Fixed(1), 1, |inputs, _| {
        let mut bytes = inputs[0].as_bytes().to_vec();
        bytes.reverse();
        Ok(vec![String::from_utf8_lossy(&bytes).into_owned()])
    });

    reg(registry, "to_upper", OutputArity::Fixed(1), 1, |inputs, _| {
        Ok(vec![inputs[0].to_ascii_uppercase()])
    });

    reg(registry, "to_lower", OutputArity::Fixed(1), 1, |inputs, _| {
        Ok(vec![inputs[0].to_ascii_lowercase()])
    });

    reg(registry, "concat", OutputArity::Fixed(1), 1, |inputs, _| Ok(vec![inputs.concat()]));

    reg(registry, "split", OutputArity::Dynamic, 1, |inputs, constants| {
        let input = &inputs[0];
        let delimiter = constants.first().map(String::as_str).unwrap_or("");
        if input.is_empty() {
            return Ok(vec![String::new()]);
        }
        if delimiter.is_empty() {
            Ok(input.chars().map(String::from).collect())
        } else {
            Ok(input.split(delimiter).map(String::from).collect())
        }
    });

    reg(registry, "trim", OutputArity::Fixed(1), 1, |inputs, _| {
        Ok(vec![inputs[0].trim_matches(|c: char| c.is_ascii_whitespace()).to_string()])
    });

    reg(registry, "replace", OutputArity::Fixed(1), 1, |inputs, constants| {
        let old = constants.first().map(String::as_str).unwrap_or("");
        let new = constants.get(1).map(String::as_str).unwrap_or("");
        if old.is_empty() {
            Ok(vec![inputs[0].clone()])
        } else {
            Ok(vec![inputs[0].replace(old, new)])
        }
    });

    reg(registry, "substring", OutputArity::Fixed(1), 1, |inputs, constants| {
        let bytes = inputs[0].as_bytes();
        let len = bytes.len();
        let start: i64 = parse_int("substring", constants.first(), "start")?;
        let length: i64 = parse_int("substring", constants.get(1), "length")?;
        let start = start.clamp(0, len as i64) as usize;
        let slice = if length == -1 {
            &bytes[start..]
        } else {
            let length = length.max(0) as usize;
            let end = (start + length).min(len);
            &bytes[start..end]
        };
        Ok(vec![String::from_utf8_lossy(slice).into_owned()])
    });

    reg(registry, "repeat", OutputArity::Fixed(1), 1, |inputs, constants| {
        let count: i64 = parse_int("repeat", constants.first(), "count")?;
        if count < 0 {
            return Err(OpError::invalid("count must be non-negative"));
        }
        Ok(vec![inputs[0].repeat(count as usize)])
    });

    reg(registry, "pad_left", OutputArity::Fixed(1), 1, |inputs, constants| pad(inputs, constants, true));
    reg(registry, "pad_right", OutputArity::Fixed(1), 1, |inputs, constants| pad(inputs, constants, false));

    reg(registry, "capitalize", OutputArity::Fixed(1), 1, |inputs, _| {
        let mut bytes = inputs[0].as_bytes().to_vec();
        for b in bytes.iter_mut().skip(1) {
            *b = b.to_ascii_lowercase();
        }
        if let Some(first) = bytes.first_mut() {
            *first = first.to_ascii_uppercase();
        }
        Ok(vec![String::from_utf8_lossy(&bytes).into_owned()])
    });

    reg(registry, "title", OutputArity::Fixed(1), 1, |inputs, _| {
        let mut bytes = inputs[0].as_bytes().to_vec();
        let mut at_word_start = true;
        for b in bytes.iter_mut() {
            if b.is_ascii_whitespace() {
                at_word_start = true;
            } else if at_word_start {
                *b = b.to_ascii_uppercase();
                at_word_start = false;
            } else {
                *b = b.to_ascii_lowercase();
            }
        }
        Ok(vec![String::from_utf8_lossy(&bytes).into_owned()])
    });
}

fn parse_int(op: &str, value: Option<&String>, field: &str) -> std::result::Result<i64, OpError> {
    let text = value.map(String::as_str).unwrap_or("0");
    text.parse::<i64>().map_err(|_| OpError::invalid(format!("{op}: '{field}' must be an integer, got '{text}'")))
}

fn pad(inputs: &[String], constants: &[String], left: bool) -> OpResult {
    let width: i64 = parse_int(if left { "pad_left" } else { "pad_right" }, constants.first(), "width")?;
    let fill = constants.get(1).map(String::as_str).unwrap_or(" ");
    if fill.len() != 1 {
        return Err(OpError::invalid("fill must be a single character"));
    }
    let width = width.max(0) as usize;
    let input = &inputs[0];
    if input.len() >= width {
        return Ok(vec![input.clone()]);
    }
    let padding = fill.repeat(width - input.len());
    Ok(vec![if left { format!("{padding}{input}") } else { format!("{input}{padding}") }])
}
