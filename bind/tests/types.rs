#![allow(clippy::float_cmp)]

use saphyr_bind::{load, load_with, ErrorKind, Registry, Time, Timestamp, Value};

fn load_core(input: &str) -> saphyr_bind::Result<Value> {
    load_with(input, &Registry::core(), &Default::default())
}

#[test]
fn yaml11_scalars() {
    let value = load(
        "
nothing: ~
empty:
bools: [yes, No, on, OFF, true, False]
ints: [0b1010, 0x1F, 017, 0o17, 1_000, +12]
floats: [1.5, 1_000.5, .inf, -.Inf, 6.8523015e+5]
base60: -1:30
base60_float: 1:30.5
words: [y, n, yes please]
",
    )
    .unwrap();
    assert_eq!(value.get("nothing"), Some(Value::Null));
    assert_eq!(value.get("empty"), Some(Value::Null));
    assert_eq!(
        value.get("bools"),
        Some(Value::from(vec![
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Boolean(true),
            Value::Boolean(false),
        ]))
    );
    assert_eq!(
        value.get("ints"),
        Some(Value::from(vec![
            Value::Integer(10),
            Value::Integer(31),
            Value::Integer(15),
            Value::Integer(15),
            Value::Integer(1000),
            Value::Integer(12),
        ]))
    );
    let floats = value.get("floats").unwrap();
    let float = |i: usize| floats.get(i).and_then(|v| v.as_floating_point()).unwrap();
    assert_eq!(float(0), 1.5);
    assert_eq!(float(1), 1000.5);
    assert_eq!(float(2), f64::INFINITY);
    assert_eq!(float(3), f64::NEG_INFINITY);
    assert_eq!(float(4), 685_230.15);
    assert_eq!(value.get("base60"), Some(Value::Integer(-90)));
    assert_eq!(value.get("base60_float"), Some(Value::from(90.5)));
    assert_eq!(
        value.get("words"),
        Some(Value::from(vec![Value::from("y"), Value::from("n"), Value::from("yes please")]))
    );
}

#[test]
fn core_scalars() {
    let value = load_core("[yes, 0b1010, 1_000, 0o17, 0x1F, 12, 1.5, ~, true, '12']").unwrap();
    assert_eq!(
        value,
        Value::from(vec![
            Value::from("yes"),
            Value::from("0b1010"),
            Value::from("1_000"),
            Value::Integer(15),
            Value::Integer(31),
            Value::Integer(12),
            Value::from(1.5),
            Value::Null,
            Value::Boolean(true),
            Value::from("12"),
        ])
    );
}

#[test]
fn explicit_tags_override_resolution() {
    let value = load("[!!str 12, !!int '12', !!float '3', !!bool 'yes', !!null 'x']").unwrap();
    assert_eq!(
        value,
        Value::from(vec![
            Value::from("12"),
            Value::Integer(12),
            Value::from(3.0),
            Value::Boolean(true),
            Value::Null,
        ])
    );
}

#[test]
fn quoted_scalars_are_strings() {
    let value = load("['yes', \"12\", '~', '']").unwrap();
    assert_eq!(
        value,
        Value::from(vec![Value::from("yes"), Value::from("12"), Value::from("~"), Value::from("")])
    );
}

#[test]
fn timestamps() {
    let value = load("- 2001-12-14\n- 2001-12-14t21:59:43.10-05:00\n- 2001-12-15 2:59:43.10\n")
        .unwrap();
    assert_eq!(
        value.get(0),
        Some(Value::Timestamp(Timestamp {
            year: 2001,
            month: 12,
            day: 14,
            time: None,
        }))
    );
    assert_eq!(
        value.get(1),
        Some(Value::Timestamp(Timestamp {
            year: 2001,
            month: 12,
            day: 14,
            time: Some(Time {
                hour: 21,
                minute: 59,
                second: 43,
                nanosecond: 100_000_000,
                offset_minutes: Some(-300),
            }),
        }))
    );
    let local = value.get(2).and_then(|v| v.as_timestamp()).unwrap();
    assert_eq!(local.time.map(|t| t.hour), Some(2));
    assert_eq!(local.time.and_then(|t| t.offset_minutes), None);

    // Timestamps are a YAML 1.1 type.
    assert_eq!(load_core("2001-12-14").unwrap(), Value::from("2001-12-14"));
}

#[test]
fn binary() {
    let value = load("!!binary |\n  aGVsbG8g\n  d29ybGQ=\n").unwrap();
    assert_eq!(value.as_binary(), Some(&b"hello world"[..]));

    let err = load("!!binary '***'").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constructor);
    assert!(err
        .problem()
        .unwrap()
        .starts_with("failed to decode base64 data"));
}

#[test]
fn sets_and_ordered_maps() {
    let value = load(
        "
set: !!set {b, a, c}
omap: !!omap [z: 1, a: 2]
pairs: !!pairs [k: 1, k: 2]
",
    )
    .unwrap();
    let set = value.get("set").unwrap();
    let items: Vec<Value> = set.as_set().unwrap().borrow().iter().cloned().collect();
    assert_eq!(items, vec![Value::from("b"), Value::from("a"), Value::from("c")]);

    let omap = value.get("omap").unwrap();
    assert_eq!(
        *omap.as_pairs().unwrap().borrow(),
        vec![
            (Value::from("z"), Value::Integer(1)),
            (Value::from("a"), Value::Integer(2))
        ]
    );
    assert_eq!(omap.get("a"), Some(Value::Integer(2)));

    let pairs = value.get("pairs").unwrap();
    assert_eq!(pairs.len(), Some(2));
    assert_eq!(pairs.get("k"), Some(Value::Integer(1)));
}

#[test]
fn ordered_map_shape_is_checked() {
    let err = load("!!omap [a: 1, {b: 2, c: 3}]").unwrap_err();
    assert_eq!(err.context(), Some("while constructing an ordered map"));
    assert_eq!(
        err.problem(),
        Some("expected a mapping of length 1, but found 2 items")
    );

    let err = load("!!pairs {a: 1}").unwrap_err();
    assert_eq!(err.context(), Some("while constructing pairs"));
    assert_eq!(err.problem(), Some("expected a sequence, but found mapping"));
}

#[test]
fn invalid_scalars() {
    for (input, problem) in [
        ("!!int twelve", "invalid integer value 'twelve'"),
        ("!!int 99999999999999999999", "integer '99999999999999999999' out of range"),
        (
            "!!int 1000000000000000000000000000000000000000000",
            "integer '1000000000000000000000000000000000000000000' out of range",
        ),
        (
            "!!int 0xffffffffffffffffffffffffffffffffffff",
            "integer '0xffffffffffffffffffffffffffffffffffff' out of range",
        ),
        (
            "!!int 1:99999999999999999999999999999999999999:0",
            "integer '1:99999999999999999999999999999999999999:0' out of range",
        ),
        ("!!float x", "invalid float value 'x'"),
        ("!!bool maybe", "invalid boolean value 'maybe'"),
        ("!!timestamp 2001-13-01", "invalid timestamp value '2001-13-01'"),
    ] {
        let err = load(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constructor, "{input}");
        assert_eq!(err.problem(), Some(problem), "{input}");
    }
}

#[test]
fn signed_digits_after_a_prefix_are_strings() {
    let input = "[0x-1, 0x+1, 0o-7, 0o+7]";
    let expected = Value::from(vec![
        Value::from("0x-1"),
        Value::from("0x+1"),
        Value::from("0o-7"),
        Value::from("0o+7"),
    ]);
    assert_eq!(load(input).unwrap(), expected);
    assert_eq!(load_core(input).unwrap(), expected);
    // A sign before the prefix is still a number.
    assert_eq!(load("-0x10").unwrap(), Value::Integer(-16));
}

#[test]
fn shape_mismatch() {
    let err = load("!!map 1").unwrap_err();
    assert_eq!(err.problem(), Some("expected a mapping node, but found scalar"));
    let err = load("!!seq {a: 1}").unwrap_err();
    assert_eq!(
        err.problem(),
        Some("expected a sequence node, but found mapping")
    );
    let err = load("!!str [a]").unwrap_err();
    assert_eq!(
        err.problem(),
        Some("expected a scalar node, but found sequence")
    );
}

#[test]
fn unhashable_keys() {
    let err = load("{[1]: bad}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constructor);
    assert_eq!(err.context(), Some("while constructing a mapping"));
    assert_eq!(err.problem(), Some("found unhashable key"));

    let err = load("{}: bad\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constructor);
    assert!(err.to_string().contains("unhashable key"));

    let err = load("!!set\n? [a]\n").unwrap_err();
    assert_eq!(err.problem(), Some("found unhashable key"));
}

#[test]
fn repeated_keys_keep_first_position() {
    let value = load("{a: 1, b: 2, a: 3}").unwrap();
    let map = value.as_mapping().unwrap().borrow();
    let entries: Vec<(Value, Value)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    assert_eq!(
        entries,
        vec![
            (Value::from("a"), Value::Integer(3)),
            (Value::from("b"), Value::Integer(2))
        ]
    );
}

#[test]
fn unknown_tags_fail_in_standard_registries() {
    let err = load("!thing 1").unwrap_err();
    assert_eq!(
        err.problem(),
        Some("could not determine a constructor for the tag '!thing'")
    );

    let value = load_with("!thing [a]", &Registry::base(), &Default::default()).unwrap();
    assert_eq!(value, Value::from(vec![Value::from("a")]));
}
