use saphyr_bind::{
    compose, load_with, tag, Construct, ErrorKind, NodeCheck, NodeKind, PathElement, Registry,
    Value,
};

#[test]
fn implicit_resolver_by_first_character() {
    let mut registry = Registry::yaml11();
    registry
        .add_implicit_resolver("!money", r"\$[0-9]+(?:\.[0-9]{2})?$", Some("$"))
        .unwrap()
        .add_constructor("!money", |ctor, node| {
            let text = ctor.construct_scalar(node)?;
            let cents = text
                .trim_start_matches('$')
                .replace('.', "")
                .parse::<i64>()
                .unwrap_or_default();
            Ok(Construct::Value(Value::Integer(cents)))
        });
    let value = load_with("[$12.50, '$3', $x]", &registry, &Default::default()).unwrap();
    assert_eq!(value.get(0), Some(Value::Integer(1250)));
    assert_eq!(value.get(1), Some(Value::from("$3")));
    assert_eq!(value.get(2), Some(Value::from("$x")));
}

#[test]
fn implicit_resolver_for_any_first_character() {
    let mut registry = Registry::core();
    registry
        .add_implicit_resolver("!word", "[a-z]+$", None)
        .unwrap();
    let document = compose("[abc, Abc, '12', 12]", &registry, &Default::default()).unwrap();
    let root = &document[document.root().unwrap()];
    let tags: Vec<&str> = root
        .items()
        .iter()
        .map(|&id| document[id].tag.as_str())
        .collect();
    assert_eq!(tags, vec!["!word", tag::STR, tag::STR, tag::INT]);
}

#[test]
fn wildcard_resolvers_come_after_the_first_character() {
    let mut registry = Registry::yaml11();
    registry
        .add_implicit_resolver("!word", "[a-z]+$", None)
        .unwrap();
    let document = compose("[yes, yup, null, nil]", &registry, &Default::default()).unwrap();
    let root = &document[document.root().unwrap()];
    let tags: Vec<&str> = root
        .items()
        .iter()
        .map(|&id| document[id].tag.as_str())
        .collect();
    assert_eq!(tags, vec![tag::BOOL, "!word", tag::NULL, "!word"]);
}

#[test]
fn invalid_implicit_resolvers() {
    let mut registry = Registry::yaml11();
    let err = registry
        .add_implicit_resolver("!x", "(unclosed", None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolver);
    let err = registry.add_implicit_resolver("", "x", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolver);
}

#[test]
fn path_resolver_forces_strings() {
    let mut registry = Registry::yaml11();
    registry
        .add_path_resolver(
            tag::STR,
            vec![PathElement::field("items"), PathElement::any()],
            Some(NodeKind::Scalar),
        )
        .unwrap();
    let value = load_with(
        "items: [yes, 12, [1]]\nother: [yes, 12]\n",
        &registry,
        &Default::default(),
    )
    .unwrap();
    let items = value.get("items").unwrap();
    assert_eq!(items.get(0), Some(Value::from("yes")));
    assert_eq!(items.get(1), Some(Value::from("12")));
    // Only scalars are affected.
    assert_eq!(items.get(2), Some(Value::from(vec![Value::Integer(1)])));
    let other = value.get("other").unwrap();
    assert_eq!(other.get(0), Some(Value::Boolean(true)));
    assert_eq!(other.get(1), Some(Value::Integer(12)));
}

#[test]
fn path_resolver_by_index_and_node_check() {
    let mut registry = Registry::yaml11();
    registry
        .add_path_resolver(
            "!first",
            vec![PathElement::item(0).with_node_check(NodeCheck::Kind(NodeKind::Sequence))],
            None,
        )
        .unwrap()
        .add_fallback_multi_constructor(saphyr_bind::construct_tagged);
    let value = load_with("[a, b]", &registry, &Default::default()).unwrap();
    let first = value.get(0).unwrap();
    let (tag, inner) = first.as_tagged().unwrap();
    assert_eq!(tag, "!first");
    assert_eq!(inner, &Value::from("a"));
    assert_eq!(value.get(1), Some(Value::from("b")));
}

#[test]
fn invalid_path_resolvers() {
    let mut registry = Registry::yaml11();
    let err = registry
        .add_path_resolver(
            "!x",
            vec![PathElement::field("a").with_node_check(NodeCheck::Kind(NodeKind::Sequence))],
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolver);
    let err = registry
        .add_path_resolver(
            "!x",
            vec![PathElement::any().with_node_check(NodeCheck::Kind(NodeKind::Scalar))],
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolver);
}

#[test]
fn explicit_tags_beat_path_resolvers() {
    let mut registry = Registry::yaml11();
    registry
        .add_path_resolver(tag::STR, vec![PathElement::any()], None)
        .unwrap();
    let value = load_with("[12, !!int '13']", &registry, &Default::default()).unwrap();
    assert_eq!(value.get(0), Some(Value::from("12")));
    assert_eq!(value.get(1), Some(Value::Integer(13)));
}
