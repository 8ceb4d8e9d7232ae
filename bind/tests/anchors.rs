use saphyr_bind::{
    load, load_with, AnchorPolicy, ErrorKind, Event, EventQueue, Loader, Registry, Value,
};

fn anchored_scalar(anchor: &str, value: &str) -> Event {
    Event::Scalar {
        anchor: Some(anchor.into()),
        tag: None,
        value: value.into(),
        style: saphyr_bind::ScalarStyle::Plain,
        implicit: (true, false),
    }
}

fn sequence_start() -> Event {
    Event::SequenceStart {
        anchor: None,
        tag: None,
        implicit: true,
        flow_style: true,
    }
}

fn document(body: Vec<Event>) -> EventQueue {
    let mut events = vec![Event::StreamStart, Event::DocumentStart];
    events.extend(body);
    events.extend([Event::DocumentEnd, Event::StreamEnd]);
    EventQueue::from_events(events)
}

#[test]
fn aliases_share_containers() {
    let value = load("a: &x [1, 2]\nb: *x\nc: [1, 2]\n").unwrap();
    let a = value.get("a").unwrap();
    assert!(a.ptr_eq(&value.get("b").unwrap()));
    assert!(!a.ptr_eq(&value.get("c").unwrap()));
    assert_eq!(a, value.get("c").unwrap());

    // A change through one path is seen through the other.
    a.as_sequence().unwrap().borrow_mut().push(Value::Integer(3));
    assert_eq!(value.get("b").unwrap().len(), Some(3));
}

#[test]
fn aliases_to_scalars() {
    let value = load("- &n 12\n- *n\n").unwrap();
    assert_eq!(value.get(0), Some(Value::Integer(12)));
    assert_eq!(value.get(1), Some(Value::Integer(12)));
}

#[test]
fn recursive_sequence() {
    let value = load("&x [1, *x]").unwrap();
    assert_eq!(value.len(), Some(2));
    assert_eq!(value.get(0), Some(Value::Integer(1)));
    assert!(value.get(1).unwrap().ptr_eq(&value));
    value.as_sequence().unwrap().borrow_mut().clear();
}

#[test]
fn recursive_mapping() {
    let value = load("&m\nname: root\nself: *m\n").unwrap();
    assert!(value.get("self").unwrap().ptr_eq(&value));
    assert_eq!(value.get("name"), Some(Value::from("root")));
    value.as_mapping().unwrap().borrow_mut().clear();
}

#[test]
fn recursive_key_is_rejected() {
    let err = load("&k {*k : 1}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constructor);
}

#[test]
fn undefined_alias() {
    let events = document(vec![
        sequence_start(),
        Event::Alias {
            anchor: "nope".into(),
        },
        Event::SequenceEnd,
    ]);
    let registry = Registry::default();
    let err = Loader::new(events, &registry).get_single_data().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Composer);
    assert_eq!(err.problem(), Some("found undefined alias 'nope'"));
    assert_eq!(err.problem_mark().map(saphyr_bind::Mark::index), Some(3));
}

#[test]
fn undefined_alias_in_text() {
    let err = load("foo: *bar\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Composer);
    assert!(err.to_string().contains("undefined alias"));
}

#[test]
fn redefined_anchor_overwrites_by_default() {
    let events = document(vec![
        sequence_start(),
        anchored_scalar("a", "first"),
        anchored_scalar("a", "second"),
        Event::Alias { anchor: "a".into() },
        Event::SequenceEnd,
    ]);
    let registry = Registry::default();
    let value = Loader::new(events, &registry).get_single_data().unwrap();
    assert_eq!(value.get(2), Some(Value::from("second")));
}

#[test]
fn redefined_anchor_can_be_rejected() {
    let events = document(vec![
        sequence_start(),
        anchored_scalar("a", "first"),
        anchored_scalar("a", "second"),
        Event::SequenceEnd,
    ]);
    let mut registry = Registry::default();
    registry.set_anchor_policy(AnchorPolicy::Reject);
    let err = Loader::new(events, &registry).get_single_data().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Composer);
    assert_eq!(err.problem(), Some("second occurrence"));
    assert_eq!(
        err.context(),
        Some("found duplicate anchor 'a'; first occurrence")
    );
    assert_eq!(err.context_mark().map(saphyr_bind::Mark::index), Some(3));
    assert_eq!(err.problem_mark().map(saphyr_bind::Mark::index), Some(4));
}

#[test]
fn redefined_anchor_in_text() {
    let input = "- &a 1\n- &a 2\n- *a\n";
    assert_eq!(
        load(input).unwrap(),
        Value::from(vec![Value::Integer(1), Value::Integer(2), Value::Integer(2)])
    );

    let mut registry = Registry::default();
    registry.set_anchor_policy(AnchorPolicy::Reject);
    let err = load_with(input, &registry, &Default::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Composer);
    assert_eq!(
        err.context(),
        Some("found duplicate anchor 'a'; first occurrence")
    );
    assert_eq!(err.context_mark().map(saphyr_bind::Mark::line), Some(0));
    assert_eq!(err.problem_mark().map(saphyr_bind::Mark::line), Some(1));

    // Distinct names are fine, whatever their properties.
    let value = load_with(
        "a: &x !!str 1\nb: !!int &y 2\nc: [*x, *y]\n",
        &registry,
        &Default::default(),
    )
    .unwrap();
    assert_eq!(
        value.get("c"),
        Some(Value::from(vec![Value::from("1"), Value::Integer(2)]))
    );
}

#[test]
fn anchors_do_not_cross_documents() {
    let mut events = vec![Event::StreamStart];
    events.extend([
        Event::DocumentStart,
        anchored_scalar("a", "1"),
        Event::DocumentEnd,
        Event::DocumentStart,
        Event::Alias { anchor: "a".into() },
        Event::DocumentEnd,
        Event::StreamEnd,
    ]);
    let registry = Registry::default();
    let mut loader = Loader::new(EventQueue::from_events(events), &registry);
    assert_eq!(loader.get_data().unwrap(), Some(Value::Integer(1)));
    let err = loader.get_data().unwrap_err();
    assert_eq!(err.problem(), Some("found undefined alias 'a'"));
}
