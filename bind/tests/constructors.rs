use std::{cell::RefCell, rc::Rc};

use saphyr_bind::{
    construct_tagged, load_with, Construct, ErrorKind, Mapping, NodeKind, Registry, Shared, Value,
};

fn load(input: &str, registry: &Registry) -> saphyr_bind::Result<Value> {
    load_with(input, registry, &Default::default())
}

#[test]
fn exact_constructor() {
    let mut registry = Registry::yaml11();
    registry.add_constructor("!upper", |ctor, node| {
        Ok(Construct::Value(Value::String(
            ctor.construct_scalar(node)?.to_uppercase(),
        )))
    });
    assert!(registry.has_constructor("!upper"));
    let value = load("[!upper abc, abc]", &registry).unwrap();
    assert_eq!(
        value,
        Value::from(vec![Value::from("ABC"), Value::from("abc")])
    );
}

#[test]
fn constructors_can_replace_standard_ones() {
    let mut registry = Registry::yaml11();
    registry.add_constructor(saphyr_bind::tag::INT, |ctor, node| {
        Ok(Construct::Value(Value::String(format!(
            "int:{}",
            ctor.construct_scalar(node)?
        ))))
    });
    let value = load("[1, 0x10]", &registry).unwrap();
    assert_eq!(
        value,
        Value::from(vec![Value::from("int:1"), Value::from("int:0x10")])
    );
}

#[test]
fn multi_constructor_gets_the_suffix() {
    let mut registry = Registry::yaml11();
    registry
        .add_multi_constructor("!color:", |ctor, suffix, node| {
            let value = ctor.construct_scalar(node)?;
            Ok(Construct::Value(Value::String(format!("{suffix}={value}"))))
        })
        .add_multi_constructor("!color:dark-", |ctor, suffix, node| {
            let value = ctor.construct_scalar(node)?;
            Ok(Construct::Value(Value::String(format!("dark {suffix}={value}"))))
        });
    let value = load("[!color:red 1, !color:dark-blue 2]", &registry).unwrap();
    assert_eq!(
        value,
        Value::from(vec![Value::from("red=1"), Value::from("dark blue=2")])
    );
}

#[test]
fn exact_constructors_beat_multi_constructors() {
    let mut registry = Registry::yaml11();
    registry
        .add_multi_constructor("!x", |_, suffix, _| {
            Ok(Construct::Value(Value::String(format!("prefix:{suffix}"))))
        })
        .add_constructor("!xy", |_, _| Ok(Construct::Value(Value::from("exact"))));
    let value = load("[!xy a, !xz b]", &registry).unwrap();
    assert_eq!(
        value,
        Value::from(vec![Value::from("exact"), Value::from("prefix:z")])
    );
}

#[test]
fn fallback_constructors() {
    let mut registry = Registry::yaml11();
    registry.add_fallback_constructor(|ctor, node| {
        Ok(Construct::Value(Value::String(format!(
            "{} as {}",
            ctor.construct_scalar(node)?,
            node.tag
        ))))
    });
    let value = load("!thing abc", &registry).unwrap();
    assert_eq!(value, Value::from("abc as !thing"));

    // A fallback multi constructor takes precedence.
    registry.add_fallback_multi_constructor(construct_tagged);
    let value = load("!thing abc", &registry).unwrap();
    assert_eq!(
        value,
        Value::Tagged("!thing".into(), Box::new(Value::from("abc")))
    );
}

#[test]
fn tagged_values_keep_their_content() {
    let mut registry = Registry::yaml11();
    registry.add_fallback_multi_constructor(construct_tagged);
    let value = load(
        "
point: !point {x: 1, y: 2}
list: !list &l [a, *l]
",
        &registry,
    )
    .unwrap();
    let point = value.get("point").unwrap();
    assert_eq!(point.as_tagged().map(|(tag, _)| tag), Some("!point"));
    assert_eq!(point.get("x"), Some(Value::Integer(1)));

    let list = value.get("list").unwrap();
    let (_, inner) = list.as_tagged().unwrap();
    assert_eq!(inner.len(), Some(2));
    // The alias yields the tagged value, whose content is the shared sequence.
    let alias = inner.get(1).unwrap();
    assert!(alias.as_tagged().unwrap().1.ptr_eq(inner));
    inner.as_sequence().unwrap().borrow_mut().clear();
}

/// A two-phase constructor: the empty mapping is returned first, filled later.
fn construct_record(
    ctor: &mut saphyr_bind::Constructor<'_>,
    node: &saphyr_bind::Node,
) -> saphyr_bind::Result<Construct> {
    ctor.expect_kind(node, NodeKind::Mapping)?;
    let record: Shared<Mapping> = Rc::new(RefCell::new(Mapping::new()));
    Ok(Construct::deferred(
        Value::Mapping(Rc::clone(&record)),
        move |ctor, node| {
            let mut entries = ctor.construct_mapping(node, false)?;
            entries.insert("kind".into(), "record".into());
            *record.borrow_mut() = entries;
            Ok(())
        },
    ))
}

#[test]
fn two_phase_constructor_supports_recursion() {
    let mut registry = Registry::yaml11();
    registry.add_constructor("!record", construct_record);
    let value = load("&r !record {name: loop, next: *r}", &registry).unwrap();
    assert_eq!(value.get("kind"), Some(Value::from("record")));
    assert!(value.get("next").unwrap().ptr_eq(&value));
    value.as_mapping().unwrap().borrow_mut().clear();
}

#[test]
fn one_phase_constructor_rejects_recursion() {
    let mut registry = Registry::yaml11();
    registry.add_constructor("!flat", |ctor, node| {
        Ok(Construct::Value(Value::sequence(
            ctor.construct_sequence(node, true)?,
        )))
    });
    let err = load("&f !flat [1, *f]", &registry).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constructor);
    assert_eq!(err.problem(), Some("found unconstructable recursive node"));

    let value = load("!flat [1, [2]]", &registry).unwrap();
    assert_eq!(value.get(1).and_then(|v| v.get(0)), Some(Value::Integer(2)));
}

#[test]
fn constructor_errors_propagate() {
    let mut registry = Registry::yaml11();
    registry.add_constructor("!even", |ctor, node| {
        let n: i64 = ctor.construct_scalar(node)?.parse().unwrap_or(1);
        if n % 2 == 0 {
            Ok(Construct::Value(Value::Integer(n)))
        } else {
            Err(saphyr_bind::YamlError::constructor(
                format!("{n} is odd"),
                Some(node.start_mark.clone()),
            ))
        }
    });
    assert_eq!(load("!even 4", &registry).unwrap(), Value::Integer(4));
    let err = load("a: [!even 3]", &registry).unwrap_err();
    assert_eq!(err.problem(), Some("3 is odd"));
    assert_eq!(err.problem_mark().map(saphyr_bind::Mark::line), Some(0));
}
