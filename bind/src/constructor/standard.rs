//! Constructors for the tags of the [YAML types repository](https://yaml.org/type/).

use std::{rc::Rc, sync::OnceLock};

use base64::prelude::*;
use ordered_float::OrderedFloat;
use regex::Regex;

use super::{Construct, Constructor};
use crate::{
    error::{Result, YamlError},
    node::{Node, NodeKind},
    registry::Registry,
    tag,
    value::{Mapping, Pairs, Sequence, Set, Shared, Time, Timestamp, Value},
};

/// The implicit types of YAML 1.1, as `(tag, regex, first characters)`.
pub(crate) const YAML11_IMPLICIT_RESOLVERS: [(&str, &str, &str); 7] = [
    (
        tag::BOOL,
        "(?:yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)$",
        "yYnNtTfFoO",
    ),
    (
        tag::FLOAT,
        r"(?:[-+]?(?:[0-9][0-9_]*)\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
        "-+0123456789.",
    ),
    (
        tag::INT,
        "(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
        "-+0123456789",
    ),
    (tag::MERGE, "<<$", "<"),
    (tag::NULL, "(?:~|null|Null|NULL)$", "~nN"),
    (
        tag::TIMESTAMP,
        r"(?:[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]|[0-9][0-9][0-9][0-9]-[0-9][0-9]?-[0-9][0-9]?(?:[Tt]|[ \t]+)[0-9][0-9]?:[0-9][0-9]:[0-9][0-9](?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9][0-9]?(?::[0-9][0-9])?))?)$",
        "0123456789",
    ),
    (tag::VALUE, "=$", "="),
];

const TIMESTAMP_PATTERN: &str = r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{1,2})-(?P<day>[0-9]{1,2})(?:(?:[Tt]|[ \t]+)(?P<hour>[0-9]{1,2}):(?P<minute>[0-9]{2}):(?P<second>[0-9]{2})(?:\.(?P<fraction>[0-9]*))?(?:[ \t]*(?P<tz>Z|(?P<tz_sign>[-+])(?P<tz_hour>[0-9]{1,2})(?::(?P<tz_minute>[0-9]{2}))?))?)?$";

/// Register the standard constructors.
///
/// With `yaml11`, integers follow YAML 1.1 (`0b`, leading-zero octal, `_`, base 60) and `!!value`
/// keys are supported.
pub(crate) fn register(registry: &mut Registry, yaml11: bool) {
    registry
        .add_constructor(tag::NULL, construct_yaml_null)
        .add_constructor(tag::BOOL, construct_yaml_bool)
        .add_constructor(tag::FLOAT, construct_yaml_float)
        .add_constructor(tag::BINARY, construct_yaml_binary)
        .add_constructor(tag::TIMESTAMP, construct_yaml_timestamp)
        .add_constructor(tag::OMAP, construct_yaml_omap)
        .add_constructor(tag::PAIRS, construct_yaml_pairs)
        .add_constructor(tag::SET, construct_yaml_set)
        .add_constructor(tag::STR, construct_yaml_str)
        .add_constructor(tag::SEQ, construct_yaml_seq)
        .add_constructor(tag::MAP, construct_yaml_map)
        .add_fallback_constructor(construct_undefined);
    if yaml11 {
        registry
            .add_constructor(tag::INT, construct_yaml_int)
            .add_constructor(tag::VALUE, construct_yaml_str);
    } else {
        registry.add_constructor(tag::INT, construct_core_int);
    }
}

fn invalid(node: &Node, what: &str, value: &str) -> YamlError {
    YamlError::constructor(
        format!("invalid {what} value '{value}'"),
        Some(node.start_mark.clone()),
    )
}

/// `!!null`: any scalar.
///
/// # Errors
/// Returns an error if the node is not a scalar.
pub fn construct_yaml_null(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    ctor.construct_scalar(node)?;
    Ok(Construct::Value(Value::Null))
}

/// `!!bool`: `true`, `yes`, `on`, `false`, `no` or `off`, in any case.
///
/// # Errors
/// Returns an error if the node is not a scalar or is not a boolean.
pub fn construct_yaml_bool(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    let value = ctor.construct_scalar(node)?;
    match value.to_lowercase().as_str() {
        "yes" | "true" | "on" => Ok(Construct::Value(Value::Boolean(true))),
        "no" | "false" | "off" => Ok(Construct::Value(Value::Boolean(false))),
        _ => Err(invalid(node, "boolean", &value)),
    }
}

/// Split an optional leading sign.
fn split_sign(value: &str) -> (bool, &str) {
    match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    }
}

/// Why an integer literal could not be read.
enum IntError {
    Invalid,
    OutOfRange,
}

/// Parse unsigned digits in the given radix.
fn parse_digits(digits: &str, radix: u32) -> Result<i128, IntError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(IntError::Invalid);
    }
    // Only overflow is left once the digits are checked.
    i128::from_str_radix(digits, radix).map_err(|_| IntError::OutOfRange)
}

/// Parse base 60 digits (`1:30`).
fn parse_sexagesimal(value: &str) -> Result<i128, IntError> {
    value.split(':').try_fold(0i128, |total, part| {
        let digit = parse_digits(part, 10)?;
        total
            .checked_mul(60)
            .and_then(|total| total.checked_add(digit))
            .ok_or(IntError::OutOfRange)
    })
}

/// Turn a parsed magnitude into an integer value.
fn signed(
    node: &Node,
    raw: &str,
    negative: bool,
    magnitude: Result<i128, IntError>,
) -> Result<Construct> {
    let out_of_range = || {
        YamlError::constructor(
            format!("integer '{raw}' out of range"),
            Some(node.start_mark.clone()),
        )
    };
    let magnitude = magnitude.map_err(|e| match e {
        IntError::Invalid => invalid(node, "integer", raw),
        IntError::OutOfRange => out_of_range(),
    })?;
    let n = if negative { -magnitude } else { magnitude };
    i64::try_from(n)
        .map(|n| Construct::Value(Value::Integer(n)))
        .map_err(|_| out_of_range())
}

/// `!!int` as of YAML 1.1: `_` separators, `0b`, `0x`, `0o`, leading-zero octal and base 60
/// (`1:30` is 90).
///
/// # Errors
/// Returns an error if the node is not a scalar, is not an integer or does not fit in an `i64`.
pub fn construct_yaml_int(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    let raw = ctor.construct_scalar(node)?;
    let cleaned = raw.replace('_', "");
    let (negative, value) = split_sign(&cleaned);
    let magnitude = if value == "0" {
        Ok(0)
    } else if let Some(digits) = value.strip_prefix("0b") {
        parse_digits(digits, 2)
    } else if let Some(digits) = value.strip_prefix("0x") {
        parse_digits(digits, 16)
    } else if let Some(digits) = value.strip_prefix("0o") {
        parse_digits(digits, 8)
    } else if let Some(digits) = value.strip_prefix('0') {
        parse_digits(digits, 8)
    } else if value.contains(':') {
        parse_sexagesimal(value)
    } else {
        parse_digits(value, 10)
    };
    signed(node, &raw, negative, magnitude)
}

/// `!!int` as of the YAML 1.2 core schema: decimal, `0x` or `0o`.
///
/// # Errors
/// Returns an error if the node is not a scalar, is not an integer or does not fit in an `i64`.
pub fn construct_core_int(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    let raw = ctor.construct_scalar(node)?;
    let (negative, value) = split_sign(&raw);
    let magnitude = if let Some(digits) = value.strip_prefix("0x") {
        parse_digits(digits, 16)
    } else if let Some(digits) = value.strip_prefix("0o") {
        parse_digits(digits, 8)
    } else {
        parse_digits(value, 10)
    };
    signed(node, &raw, negative, magnitude)
}

/// `!!float`: `_` separators, `.inf`, `.nan` and base 60 (`1:30.5` is 90.5).
///
/// # Errors
/// Returns an error if the node is not a scalar or is not a number.
pub fn construct_yaml_float(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    let raw = ctor.construct_scalar(node)?;
    let cleaned = raw.replace('_', "").to_lowercase();
    let (negative, value) = split_sign(&cleaned);
    let parse = |part: &str| {
        if part.bytes().any(|b| b.is_ascii_digit()) {
            part.parse::<f64>().ok()
        } else {
            None
        }
    };
    let magnitude = match value {
        ".inf" => Some(f64::INFINITY),
        ".nan" => Some(f64::NAN),
        _ if value.contains(':') => value
            .split(':')
            .try_fold(0.0, |total, part| parse(part).map(|d| total * 60.0 + d)),
        _ => parse(value),
    };
    let magnitude = magnitude.ok_or_else(|| invalid(node, "float", &raw))?;
    let n = if negative { -magnitude } else { magnitude };
    Ok(Construct::Value(Value::FloatingPoint(OrderedFloat(n))))
}

/// `!!binary`: base64, whitespace ignored.
///
/// # Errors
/// Returns an error if the node is not a scalar or is not valid base64.
pub fn construct_yaml_binary(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    let value = ctor.construct_scalar(node)?;
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_STANDARD
        .decode(cleaned)
        .map(|bytes| Construct::Value(Value::Binary(bytes)))
        .map_err(|e| {
            YamlError::constructor(
                format!("failed to decode base64 data: {e}"),
                Some(node.start_mark.clone()),
            )
            .with_context("while constructing a binary", None)
        })
}

fn timestamp_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).ok()).as_ref()
}

fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let captures = timestamp_regex()?.captures(value)?;
    let number = |name: &str| captures.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
    let small = |name: &str| number(name).and_then(|n| u8::try_from(n).ok());

    let year = u16::try_from(number("year")?).ok()?;
    let month = small("month").filter(|m| (1..=12).contains(m))?;
    let day = small("day").filter(|d| (1..=31).contains(d))?;
    let time = if captures.name("hour").is_some() {
        let hour = small("hour").filter(|&h| h < 24)?;
        let minute = small("minute").filter(|&m| m < 60)?;
        let second = small("second").filter(|&s| s <= 60)?;
        let nanosecond = match captures.name("fraction") {
            Some(fraction) => {
                let digits: String = fraction.as_str().chars().take(9).collect();
                format!("{digits:0<9}").parse().ok()?
            }
            None => 0,
        };
        let offset_minutes = match captures.name("tz").map(|m| m.as_str()) {
            None => None,
            Some("Z") => Some(0),
            Some(_) => {
                let hours = i16::try_from(number("tz_hour")?).ok()?;
                let minutes = i16::try_from(number("tz_minute").unwrap_or(0)).ok()?;
                let offset = hours * 60 + minutes;
                Some(if captures.name("tz_sign")?.as_str() == "-" {
                    -offset
                } else {
                    offset
                })
            }
        };
        Some(Time {
            hour,
            minute,
            second,
            nanosecond,
            offset_minutes,
        })
    } else {
        None
    };
    Some(Timestamp {
        year,
        month,
        day,
        time,
    })
}

/// `!!timestamp`: `2001-12-14`, `2001-12-14t21:59:43.10-05:00`, `2001-12-14 21:59:43.10 -5`,
/// ...
///
/// # Errors
/// Returns an error if the node is not a scalar or is not a valid timestamp.
pub fn construct_yaml_timestamp(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    let value = ctor.construct_scalar(node)?;
    parse_timestamp(&value)
        .map(|timestamp| Construct::Value(Value::Timestamp(timestamp)))
        .ok_or_else(|| invalid(node, "timestamp", &value))
}

/// `!!omap`: a sequence of single-entry mappings. Two-phase.
///
/// # Errors
/// Returns an error if the node is not a sequence.
pub fn construct_yaml_omap(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    construct_pairs_in_two_phases(ctor, node, "while constructing an ordered map")
}

/// `!!pairs`: a sequence of single-entry mappings, keys may repeat. Two-phase.
///
/// # Errors
/// Returns an error if the node is not a sequence.
pub fn construct_yaml_pairs(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    construct_pairs_in_two_phases(ctor, node, "while constructing pairs")
}

fn construct_pairs_in_two_phases(
    ctor: &mut Constructor<'_>,
    node: &Node,
    context: &'static str,
) -> Result<Construct> {
    ctor.expect_pairs(node, context)?;
    let pairs: Shared<Pairs> = Rc::default();
    Ok(Construct::deferred(Value::Pairs(Rc::clone(&pairs)), move |ctor, node| {
        let entries = ctor.pairs_in_context(node, false, context)?;
        pairs.borrow_mut().extend(entries);
        Ok(())
    }))
}

/// `!!set`: a mapping whose values are ignored. Two-phase.
///
/// # Errors
/// Returns an error if the node is not a mapping.
pub fn construct_yaml_set(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    ctor.expect_kind(node, NodeKind::Mapping)?;
    let set: Shared<Set> = Rc::default();
    Ok(Construct::deferred(Value::Set(Rc::clone(&set)), move |ctor, node| {
        let mapping = ctor.construct_mapping(node, false)?;
        set.borrow_mut().extend(mapping.into_iter().map(|(key, _)| key));
        Ok(())
    }))
}

/// `!!str`: the content of a scalar.
///
/// # Errors
/// Returns an error if the node is not a scalar.
pub fn construct_yaml_str(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    Ok(Construct::Value(Value::String(ctor.construct_scalar(node)?)))
}

/// `!!seq`. Two-phase.
///
/// # Errors
/// Returns an error if the node is not a sequence.
pub fn construct_yaml_seq(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    ctor.expect_kind(node, NodeKind::Sequence)?;
    let seq: Shared<Sequence> = Rc::default();
    Ok(Construct::deferred(Value::Sequence(Rc::clone(&seq)), move |ctor, node| {
        let items = ctor.construct_sequence(node, false)?;
        seq.borrow_mut().extend(items);
        Ok(())
    }))
}

/// `!!map`. Two-phase.
///
/// # Errors
/// Returns an error if the node is not a mapping.
pub fn construct_yaml_map(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    ctor.expect_kind(node, NodeKind::Mapping)?;
    let map: Shared<Mapping> = Rc::default();
    Ok(Construct::deferred(Value::Mapping(Rc::clone(&map)), move |ctor, node| {
        let entries = ctor.construct_mapping(node, false)?;
        *map.borrow_mut() = entries;
        Ok(())
    }))
}

/// Build a node from its shape only: a string, a sequence or a mapping.
///
/// # Errors
/// Returns an error if a child fails to build.
pub fn construct_from_shape(ctor: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    match node.kind() {
        NodeKind::Scalar => construct_yaml_str(ctor, node),
        NodeKind::Sequence => construct_yaml_seq(ctor, node),
        NodeKind::Mapping => construct_yaml_map(ctor, node),
    }
}

/// Fail on a tag that nothing claims.
///
/// # Errors
/// Always.
pub fn construct_undefined(_: &mut Constructor<'_>, node: &Node) -> Result<Construct> {
    Err(YamlError::constructor(
        format!("could not determine a constructor for the tag '{}'", node.tag),
        Some(node.start_mark.clone()),
    ))
}

/// Build a node from its shape and keep its tag, as a [`Value::Tagged`].
///
/// Fit for [`Registry::add_fallback_multi_constructor`], to load documents with application
/// tags without registering them.
///
/// ```
/// use saphyr_bind::{construct_tagged, Registry, Value};
///
/// let mut registry = Registry::yaml11();
/// registry.add_fallback_multi_constructor(construct_tagged);
/// let value = saphyr_bind::load_with("!point [1, 2]", &registry, &Default::default()).unwrap();
/// let (tag, inner) = value.as_tagged().unwrap();
/// assert_eq!(tag, "!point");
/// assert_eq!(inner.len(), Some(2));
/// ```
///
/// # Errors
/// Returns an error if a child fails to build.
pub fn construct_tagged(ctor: &mut Constructor<'_>, tag: &str, node: &Node) -> Result<Construct> {
    let tagged = |value: Value| Value::Tagged(tag.to_string(), Box::new(value));
    Ok(match construct_from_shape(ctor, node)? {
        Construct::Value(value) => Construct::Value(tagged(value)),
        Construct::Deferred(placeholder, fill) => Construct::Deferred(tagged(placeholder), fill),
    })
}
