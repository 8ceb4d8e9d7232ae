//! Native values produced by the [`Constructor`].
//!
//! Collections are shared (`Rc<RefCell<_>>`): every alias of an anchored collection node
//! constructs to the same container, and a container may hold itself. Use [`Value::ptr_eq`] to
//! check identity.
//!
//! [`Constructor`]: crate::Constructor

use std::{
    cell::RefCell,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use hashlink::{LinkedHashMap, LinkedHashSet};
use ordered_float::OrderedFloat;

use crate::index::Accessor;

/// A shared, mutable container.
pub type Shared<T> = Rc<RefCell<T>>;
/// The contents of a [`Value::Sequence`].
pub type Sequence = Vec<Value>;
/// The contents of a [`Value::Mapping`]. Insertion order is preserved.
pub type Mapping = LinkedHashMap<Value, Value>;
/// The contents of a [`Value::Set`]. Insertion order is preserved.
pub type Set = LinkedHashSet<Value>;
/// The contents of a [`Value::Pairs`]. Keys may repeat.
pub type Pairs = Vec<(Value, Value)>;

/// A time of day, with an optional offset from UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Time {
    /// Hour, from 0 to 23.
    pub hour: u8,
    /// Minute, from 0 to 59.
    pub minute: u8,
    /// Second, from 0 to 60 (leap second).
    pub second: u8,
    /// Sub-second part, in nanoseconds.
    pub nanosecond: u32,
    /// Offset from UTC in minutes. [`None`] if the timestamp has no timezone.
    pub offset_minutes: Option<i16>,
}

/// A [timestamp](https://yaml.org/type/timestamp.html): a date, optionally followed by a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    /// Year.
    pub year: u16,
    /// Month, from 1 to 12.
    pub month: u8,
    /// Day of the month, from 1 to 31.
    pub day: u8,
    /// The time of the day, if any.
    pub time: Option<Time>,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)?;
        let Some(time) = self.time else {
            return Ok(());
        };
        write!(f, "T{:02}:{:02}:{:02}", time.hour, time.minute, time.second)?;
        if time.nanosecond != 0 {
            let fraction = format!("{:09}", time.nanosecond);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        match time.offset_minutes {
            None => Ok(()),
            Some(0) => f.write_str("Z"),
            Some(offset) => {
                let sign = if offset < 0 { '-' } else { '+' };
                let offset = offset.unsigned_abs();
                write!(f, "{sign}{:02}:{:02}", offset / 60, offset % 60)
            }
        }
    }
}

/// A constructed YAML value.
///
/// # Warning
/// Containers are not hashable in the YAML sense (see [`Value::is_hashable`]). They still
/// implement [`Hash`] so that `Value` can be used as a mapping key type, but all containers of a
/// given variant hash the same. The constructor refuses to use them as keys.
///
/// Equality is structural. It terminates on self-referential containers.
#[derive(Clone)]
pub enum Value {
    /// `~`, `null`, or an empty plain scalar.
    Null,
    /// A boolean.
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// A floating point number.
    FloatingPoint(OrderedFloat<f64>),
    /// A string.
    String(String),
    /// Decoded `!!binary` data.
    Binary(Vec<u8>),
    /// A `!!timestamp`.
    Timestamp(Timestamp),
    /// A sequence (`!!seq`).
    Sequence(Shared<Sequence>),
    /// A mapping (`!!map`).
    Mapping(Shared<Mapping>),
    /// A set (`!!set`).
    Set(Shared<Set>),
    /// An ordered list of key/value pairs (`!!omap`, `!!pairs`).
    Pairs(Shared<Pairs>),
    /// A value whose tag has no dedicated constructor, alongside the tag.
    Tagged(String, Box<Value>),
}

impl Value {
    /// Create a new shared sequence.
    #[must_use]
    pub fn sequence(items: Sequence) -> Self {
        Self::Sequence(Rc::new(RefCell::new(items)))
    }

    /// Create a new shared mapping.
    #[must_use]
    pub fn mapping(entries: Mapping) -> Self {
        Self::Mapping(Rc::new(RefCell::new(entries)))
    }

    /// Create a new shared set.
    #[must_use]
    pub fn set(items: Set) -> Self {
        Self::Set(Rc::new(RefCell::new(items)))
    }

    /// Create a new shared list of pairs.
    #[must_use]
    pub fn pairs(items: Pairs) -> Self {
        Self::Pairs(Rc::new(RefCell::new(items)))
    }

    define_as!(as_bool, bool, Self::Boolean(v) => Some(v));
    define_as!(as_integer, i64, Self::Integer(v) => Some(v));
    define_as!(as_floating_point, f64, Self::FloatingPoint(v) => Some(v.into_inner()));
    define_as!(as_timestamp, Timestamp, Self::Timestamp(v) => Some(v));

    define_as_ref!(as_str, &str, Self::String(v) => Some(v.as_str()));
    define_as_ref!(as_binary, &[u8], Self::Binary(v) => Some(v.as_slice()));
    define_as_ref!(as_sequence, &Shared<Sequence>, Self::Sequence(v) => Some(v));
    define_as_ref!(as_mapping, &Shared<Mapping>, Self::Mapping(v) => Some(v));
    define_as_ref!(as_set, &Shared<Set>, Self::Set(v) => Some(v));
    define_as_ref!(as_pairs, &Shared<Pairs>, Self::Pairs(v) => Some(v));
    define_as_ref!(as_tagged, (&str, &Value), Self::Tagged(tag, v) => Some((tag.as_str(), &**v)));

    define_is!(is_null, Self::Null);
    define_is!(is_boolean, Self::Boolean(_));
    define_is!(is_integer, Self::Integer(_));
    define_is!(is_floating_point, Self::FloatingPoint(_));
    define_is!(is_string, Self::String(_));
    define_is!(is_binary, Self::Binary(_));
    define_is!(is_timestamp, Self::Timestamp(_));
    define_is!(is_sequence, Self::Sequence(_));
    define_is!(is_mapping, Self::Mapping(_));
    define_is!(is_set, Self::Set(_));
    define_is!(is_pairs, Self::Pairs(_));
    define_is!(is_tagged, Self::Tagged(..));

    /// Return whether the value may be used as a mapping key or a set item.
    ///
    /// Containers are mutable and cannot be keys. A tagged value is hashable if its inner value
    /// is.
    #[must_use]
    pub fn is_hashable(&self) -> bool {
        match self {
            Self::Sequence(_) | Self::Mapping(_) | Self::Set(_) | Self::Pairs(_) => false,
            Self::Tagged(_, inner) => inner.is_hashable(),
            _ => true,
        }
    }

    /// Return whether `self` and `other` are the same shared container.
    ///
    /// Scalars are never identical, even if they are equal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Sequence(a), Self::Sequence(b)) => Rc::ptr_eq(a, b),
            (Self::Mapping(a), Self::Mapping(b)) => Rc::ptr_eq(a, b),
            (Self::Set(a), Self::Set(b)) => Rc::ptr_eq(a, b),
            (Self::Pairs(a), Self::Pairs(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Look up an element of a sequence or a mapping.
    ///
    /// Tagged values are looked through. For [`Value::Pairs`], a field accessor returns the value
    /// of the first pair with that key.
    ///
    /// # Return
    /// Returns a clone of the element (containers are shared, not copied), or [`None`] if `self`
    /// is not indexable or the element does not exist.
    #[must_use]
    pub fn get(&self, key: impl Into<Accessor>) -> Option<Value> {
        let key = key.into();
        let found = match (self, key) {
            (Self::Sequence(seq), Accessor::Index(index)) => seq.borrow().get(index).cloned(),
            (Self::Mapping(map), Accessor::Field(field)) => {
                map.borrow().get(&Value::String(field)).cloned()
            }
            (Self::Mapping(map), Accessor::Index(index)) => i64::try_from(index)
                .ok()
                .and_then(|index| map.borrow().get(&Value::Integer(index)).cloned()),
            (Self::Pairs(pairs), Accessor::Field(field)) => pairs
                .borrow()
                .iter()
                .find(|(k, _)| k.as_str() == Some(field.as_str()))
                .map(|(_, v)| v.clone()),
            (Self::Tagged(_, inner), key) => inner.get(key),
            _ => None,
        };
        found
    }

    /// Return the number of elements in a container, or [`None`] for scalars.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Sequence(v) => Some(v.borrow().len()),
            Self::Mapping(v) => Some(v.borrow().len()),
            Self::Set(v) => Some(v.borrow().len()),
            Self::Pairs(v) => Some(v.borrow().len()),
            Self::Tagged(_, inner) => inner.len(),
            _ => None,
        }
    }

    /// Return a short name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::FloatingPoint(_) => "float",
            Self::String(_) => "str",
            Self::Binary(_) => "binary",
            Self::Timestamp(_) => "timestamp",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::Set(_) => "set",
            Self::Pairs(_) => "pairs",
            Self::Tagged(..) => "tagged",
        }
    }
}

/// Structural comparison that terminates on cyclic containers.
///
/// `open` holds the pairs of containers being compared. A pair met again is assumed equal: any
/// difference will be found elsewhere in the comparison.
struct EqState {
    open: Vec<(usize, usize)>,
}

impl EqState {
    fn values(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::FloatingPoint(a), Value::FloatingPoint(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => self.containers(a, b, |state, a, b| {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| state.values(a, b))
            }),
            (Value::Mapping(a), Value::Mapping(b)) => self.containers(a, b, |state, a, b| {
                // A mapping is unordered.
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| state.values(v, w)))
            }),
            (Value::Set(a), Value::Set(b)) => self.containers(a, b, |_, a, b| {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }),
            (Value::Pairs(a), Value::Pairs(b)) => self.containers(a, b, |state, a, b| {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| state.values(ka, kb) && state.values(va, vb))
            }),
            (Value::Tagged(tag_a, a), Value::Tagged(tag_b, b)) => {
                tag_a == tag_b && self.values(a, b)
            }
            _ => false,
        }
    }

    fn containers<T>(
        &mut self,
        a: &Shared<T>,
        b: &Shared<T>,
        compare: impl FnOnce(&mut Self, &T, &T) -> bool,
    ) -> bool {
        if Rc::ptr_eq(a, b) {
            return true;
        }
        let key = (
            Rc::as_ptr(a).cast::<()>() as usize,
            Rc::as_ptr(b).cast::<()>() as usize,
        );
        if self.open.contains(&key) {
            return true;
        }
        let (Ok(a), Ok(b)) = (a.try_borrow(), b.try_borrow()) else {
            return false;
        };
        self.open.push(key);
        let equal = compare(self, &a, &b);
        self.open.pop();
        equal
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        EqState { open: vec![] }.values(self, other)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Boolean(v) => v.hash(state),
            Self::Integer(v) => v.hash(state),
            Self::FloatingPoint(v) => v.hash(state),
            Self::String(v) => v.hash(state),
            Self::Binary(v) => v.hash(state),
            Self::Timestamp(v) => v.hash(state),
            Self::Tagged(tag, v) => {
                tag.hash(state);
                v.hash(state);
            }
            Self::Null | Self::Sequence(_) | Self::Mapping(_) | Self::Set(_) | Self::Pairs(_) => {}
        }
    }
}

/// [`Debug`] helper that renders containers already being printed as `...`.
///
/// [`Debug`]: std::fmt::Debug
struct DebugValue<'a> {
    value: &'a Value,
    /// Addresses of the containers currently being printed.
    seen: &'a RefCell<Vec<usize>>,
}

impl DebugValue<'_> {
    fn nested<'b>(&'b self, value: &'b Value) -> DebugValue<'b> {
        DebugValue {
            value,
            seen: self.seen,
        }
    }

    fn container<T>(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        shared: &Shared<T>,
        print: impl FnOnce(&T, &mut fmt::Formatter<'_>) -> fmt::Result,
    ) -> fmt::Result {
        let address = Rc::as_ptr(shared).cast::<()>() as usize;
        if self.seen.borrow().contains(&address) {
            return write!(f, "{name}(...)");
        }
        let Ok(inner) = shared.try_borrow() else {
            return write!(f, "{name}(<borrowed>)");
        };
        self.seen.borrow_mut().push(address);
        f.write_str(name)?;
        let result = print(&inner, f);
        self.seen.borrow_mut().pop();
        result
    }
}

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => f.write_str("Null"),
            Value::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            Value::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Value::FloatingPoint(v) => f.debug_tuple("FloatingPoint").field(&v.0).finish(),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Binary(v) => f.debug_tuple("Binary").field(v).finish(),
            Value::Timestamp(v) => f.debug_tuple("Timestamp").field(v).finish(),
            Value::Tagged(tag, v) => f
                .debug_tuple("Tagged")
                .field(tag)
                .field(&self.nested(v))
                .finish(),
            Value::Sequence(seq) => self.container(f, "Sequence", seq, |items, f| {
                f.debug_list()
                    .entries(items.iter().map(|v| self.nested(v)))
                    .finish()
            }),
            Value::Mapping(map) => self.container(f, "Mapping", map, |entries, f| {
                f.debug_map()
                    .entries(entries.iter().map(|(k, v)| (self.nested(k), self.nested(v))))
                    .finish()
            }),
            Value::Set(set) => self.container(f, "Set", set, |items, f| {
                f.debug_set()
                    .entries(items.iter().map(|v| self.nested(v)))
                    .finish()
            }),
            Value::Pairs(pairs) => self.container(f, "Pairs", pairs, |items, f| {
                f.debug_list()
                    .entries(
                        items
                            .iter()
                            .map(|(k, v)| (self.nested(k), self.nested(v))),
                    )
                    .finish()
            }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seen = RefCell::new(vec![]);
        DebugValue { value: self, seen: &seen }.fmt(f)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::FloatingPoint(OrderedFloat(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::sequence(value)
    }
}

#[cfg(test)]
mod test {
    use super::{Mapping, Time, Timestamp, Value};

    #[test]
    fn mapping_equality_ignores_order() {
        let mut a = Mapping::new();
        a.insert("x".into(), Value::Integer(1));
        a.insert("y".into(), Value::Integer(2));
        let mut b = Mapping::new();
        b.insert("y".into(), Value::Integer(2));
        b.insert("x".into(), Value::Integer(1));
        assert_eq!(Value::mapping(a), Value::mapping(b));
    }

    #[test]
    fn containers_are_not_hashable() {
        assert!(Value::from("k").is_hashable());
        assert!(!Value::sequence(vec![]).is_hashable());
        assert!(!Value::Tagged("!t".into(), Box::new(Value::mapping(Mapping::new()))).is_hashable());
        assert!(Value::Tagged("!t".into(), Box::new(Value::Integer(1))).is_hashable());
    }

    #[test]
    fn debug_survives_cycles() {
        let list = Value::sequence(vec![Value::Integer(1)]);
        list.as_sequence().unwrap().borrow_mut().push(list.clone());
        assert_eq!(format!("{list:?}"), "Sequence[Integer(1), Sequence(...)]");
        assert_eq!(list.get(1).unwrap(), list);
    }

    #[test]
    fn equality_survives_distinct_cycles() {
        let cycle = || {
            let list = Value::sequence(vec![Value::Integer(1)]);
            list.as_sequence().unwrap().borrow_mut().push(list.clone());
            list
        };
        let (a, b) = (cycle(), cycle());
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        let c = Value::sequence(vec![Value::Integer(2), a.clone()]);
        assert_ne!(c, b);
        for list in [a, b] {
            list.as_sequence().unwrap().borrow_mut().clear();
        }
    }

    #[test]
    fn get_looks_through_containers() {
        let mut map = Mapping::new();
        map.insert("a".into(), Value::sequence(vec!["x".into(), "y".into()]));
        map.insert(Value::Integer(3), "three".into());
        let value = Value::Tagged("!wrap".into(), Box::new(Value::mapping(map)));
        assert_eq!(value.get("a").and_then(|a| a.get(1)), Some("y".into()));
        assert_eq!(value.get(3), Some("three".into()));
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    fn timestamp_display() {
        let date = Timestamp {
            year: 2002,
            month: 12,
            day: 14,
            time: None,
        };
        assert_eq!(date.to_string(), "2002-12-14");
        let precise = Timestamp {
            time: Some(Time {
                hour: 21,
                minute: 59,
                second: 43,
                nanosecond: 100_000_000,
                offset_minutes: Some(-300),
            }),
            ..date
        };
        assert_eq!(precise.to_string(), "2002-12-14T21:59:43.1-05:00");
    }
}
