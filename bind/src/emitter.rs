//! Render values back to YAML text.
//!
//! The output is a single document in flow style. Scalars are written plain when they would be
//! resolved back to a string, double-quoted otherwise. Values whose type cannot be told from
//! their text (binary data, timestamps, sets, pairs, tagged values) carry an explicit tag, so
//! that loading the output with [`Registry::yaml11`] or [`Registry::core`] yields an equal value.
//!
//! [`Registry::yaml11`]: crate::Registry::yaml11
//! [`Registry::core`]: crate::Registry::core

use std::{fmt::Write, rc::Rc};

use base64::prelude::*;

use crate::{
    error::{Result, YamlError},
    node::NodeKind,
    registry::Registry,
    resolver::Resolver,
    tag,
    value::{Shared, Value},
};

thread_local! {
    /// The registry [`dump`] quotes strings against.
    static YAML11: Registry = Registry::yaml11();
}

/// Render `value` as a YAML document, terminated by a newline.
///
/// Strings are quoted when [`Registry::yaml11`] would read them as something else.
///
/// ```
/// let value = saphyr_bind::load("a: [1, 'yes', 2.5]").unwrap();
/// assert_eq!(saphyr_bind::dump(&value).unwrap(), "{a: [1, \"yes\", 2.5]}\n");
/// ```
///
/// # Errors
/// Returns a [`YamlError::Emitter`] if `value` contains itself.
pub fn dump(value: &Value) -> Result<String> {
    YAML11.with(|registry| dump_with(value, registry))
}

/// Render `value` as a YAML document, quoting strings that `registry` would not read back as
/// strings.
///
/// # Errors
/// Returns a [`YamlError::Emitter`] if `value` contains itself.
pub fn dump_with(value: &Value, registry: &Registry) -> Result<String> {
    let mut emitter = Emitter {
        resolver: Resolver::new(&registry.resolvers),
        out: String::new(),
        open: vec![],
    };
    emitter.emit(value)?;
    emitter.out.push('\n');
    Ok(emitter.out)
}

struct Emitter<'r> {
    /// Decides whether a string can be written plain.
    resolver: Resolver<'r>,
    out: String,
    /// Addresses of the containers being written.
    open: Vec<usize>,
}

impl Emitter<'_> {
    fn emit(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Boolean(v) => self.out.push_str(if *v { "true" } else { "false" }),
            Value::Integer(v) => self.write(format_args!("{v}")),
            Value::FloatingPoint(v) => self.emit_float(v.into_inner()),
            Value::String(v) => self.emit_str(v),
            Value::Binary(v) => {
                self.out.push_str("!!binary ");
                self.emit_double_quoted(&BASE64_STANDARD.encode(v));
            }
            Value::Timestamp(v) => {
                self.out.push_str("!!timestamp ");
                self.emit_double_quoted(&v.to_string());
            }
            Value::Sequence(seq) => self.container(seq, |this, items| {
                this.out.push('[');
                this.emit_separated(items.iter(), Self::emit)?;
                this.out.push(']');
                Ok(())
            })?,
            Value::Mapping(map) => self.container(map, |this, entries| {
                this.out.push('{');
                this.emit_separated(entries.iter(), Self::emit_entry)?;
                this.out.push('}');
                Ok(())
            })?,
            Value::Set(set) => self.container(set, |this, items| {
                this.out.push_str("!!set {");
                this.emit_separated(items.iter(), |this, item| {
                    this.emit_entry((item, &Value::Null))
                })?;
                this.out.push('}');
                Ok(())
            })?,
            Value::Pairs(pairs) => self.container(pairs, |this, items| {
                this.out.push_str("!!pairs [");
                this.emit_separated(items.iter(), |this, (k, v)| {
                    this.out.push('{');
                    this.emit_entry((k, v))?;
                    this.out.push('}');
                    Ok(())
                })?;
                this.out.push(']');
                Ok(())
            })?,
            Value::Tagged(tag, inner) => {
                self.out.push_str(&tag::shorthand(tag));
                self.out.push(' ');
                self.emit(inner)?;
            }
        }
        Ok(())
    }

    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        // Writing to a `String` does not fail.
        let _ = self.out.write_fmt(args);
    }

    fn container<T>(
        &mut self,
        shared: &Shared<T>,
        f: impl FnOnce(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        let address = Rc::as_ptr(shared).cast::<()>() as usize;
        if self.open.contains(&address) {
            return Err(YamlError::Emitter(
                "cannot emit a recursive container".to_string(),
            ));
        }
        let inner = shared
            .try_borrow()
            .map_err(|_| YamlError::Emitter("container is borrowed mutably".to_string()))?;
        self.open.push(address);
        let result = f(self, &inner);
        self.open.pop();
        result
    }

    fn emit_separated<I, T>(
        &mut self,
        items: I,
        emit: impl Fn(&mut Self, T) -> Result<()>,
    ) -> Result<()>
    where
        I: Iterator<Item = T>,
    {
        for (i, item) in items.enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            emit(self, item)?;
        }
        Ok(())
    }

    fn emit_entry(&mut self, (key, value): (&Value, &Value)) -> Result<()> {
        self.emit(key)?;
        self.out.push_str(": ");
        self.emit(value)
    }

    fn emit_float(&mut self, v: f64) {
        if v.is_nan() {
            self.out.push_str(".nan");
        } else if v.is_infinite() {
            self.out.push_str(if v > 0.0 { ".inf" } else { "-.inf" });
        } else {
            let text = v.to_string();
            self.out.push_str(&text);
            if !text.contains('.') {
                self.out.push_str(".0");
            }
        }
    }

    fn emit_str(&mut self, v: &str) {
        let plain = !needs_quotes(v)
            && self.resolver.resolve(NodeKind::Scalar, Some(v), (true, false)) == tag::STR;
        if plain {
            self.out.push_str(v);
        } else {
            self.emit_double_quoted(v);
        }
    }

    fn emit_double_quoted(&mut self, v: &str) {
        self.out.push('"');
        for c in v.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\t' => self.out.push_str("\\t"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                c if !is_printable(c) => {
                    if u32::from(c) <= 0xFFFF {
                        self.write(format_args!("\\u{:04x}", u32::from(c)));
                    } else {
                        self.write(format_args!("\\U{:08x}", u32::from(c)));
                    }
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

/// Check whether the string can be written as a plain scalar inside a flow collection.
///
/// This only looks at the characters. Whether the plain scalar would resolve to another type is
/// decided by the resolver.
fn needs_quotes(string: &str) -> bool {
    string.is_empty()
        || string.starts_with(|c: char| {
            matches!(
                c,
                ' ' | '&' | '*' | '?' | '|' | '-' | '<' | '>' | '=' | '!' | '%' | '@' | '.'
            )
        })
        || string.ends_with(' ')
        || string.contains(|c: char| {
            matches!(
                c,
                ':' | '{' | '}' | '[' | ']' | ',' | '#' | '`' | '"' | '\'' | '\\' | '\t' | '\n'
                    | '\r'
            ) || !is_printable(c)
        })
}

/// Whether the character may appear unescaped in a YAML stream.
fn is_printable(c: char) -> bool {
    matches!(c,
        '\x20'..='\x7e'
        | '\u{a0}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fefe}'
        | '\u{ff00}'..='\u{fffd}'
        | '\u{10000}'..='\u{10ffff}')
}

#[cfg(test)]
mod test {
    use super::{dump, dump_with, needs_quotes};
    use crate::{
        registry::Registry,
        value::{Mapping, Value},
    };

    #[test]
    fn strings_are_quoted_when_ambiguous() {
        for (string, expected) in [
            ("plain", "plain\n"),
            ("two words", "two words\n"),
            ("yes", "\"yes\"\n"),
            ("12", "\"12\"\n"),
            ("1_000", "\"1_000\"\n"),
            ("2001-12-14", "\"2001-12-14\"\n"),
            ("~", "\"~\"\n"),
            ("", "\"\"\n"),
            ("a: b", "\"a: b\"\n"),
            ("line\nbreak", "\"line\\nbreak\"\n"),
            ("bell\x07", "\"bell\\u0007\"\n"),
        ] {
            assert_eq!(dump(&Value::from(string)).unwrap(), expected, "{string:?}");
        }
        assert!(needs_quotes(" padded"));
        assert!(needs_quotes("- item"));
        assert!(!needs_quotes("key"));
    }

    #[test]
    fn quoting_follows_the_registry() {
        let core = Registry::core();
        assert_eq!(dump_with(&Value::from("yes"), &core).unwrap(), "yes\n");
        assert_eq!(dump(&Value::from("yes")).unwrap(), "\"yes\"\n");

        let mut money = Registry::yaml11();
        money
            .add_implicit_resolver("!money", r"\$[0-9]+$", Some("$"))
            .unwrap();
        assert_eq!(dump_with(&Value::from("$12"), &money).unwrap(), "\"$12\"\n");
        assert_eq!(dump(&Value::from("$12")).unwrap(), "$12\n");
    }

    #[test]
    fn scalars() {
        assert_eq!(dump(&Value::Null).unwrap(), "null\n");
        assert_eq!(dump(&Value::Boolean(false)).unwrap(), "false\n");
        assert_eq!(dump(&Value::Integer(-3)).unwrap(), "-3\n");
        assert_eq!(dump(&Value::from(2.0)).unwrap(), "2.0\n");
        assert_eq!(dump(&Value::from(f64::NEG_INFINITY)).unwrap(), "-.inf\n");
        assert_eq!(
            dump(&Value::Binary(b"hi".to_vec())).unwrap(),
            "!!binary \"aGk=\"\n"
        );
    }

    #[test]
    fn containers() {
        let mut map = Mapping::new();
        map.insert("a".into(), Value::from(vec![Value::Integer(1), Value::Null]));
        map.insert("b".into(), Value::mapping(Mapping::new()));
        assert_eq!(
            dump(&Value::mapping(map)).unwrap(),
            "{a: [1, null], b: {}}\n"
        );
        assert_eq!(
            dump(&Value::Tagged("!point".into(), Box::new(Value::from(vec![])))).unwrap(),
            "!point []\n"
        );
    }

    #[test]
    fn recursive_containers_are_rejected() {
        let seq = Value::from(vec![]);
        if let Value::Sequence(items) = &seq {
            items.borrow_mut().push(seq.clone());
        }
        assert!(dump(&seq).is_err());
        // Break the cycle so the test does not leak.
        if let Value::Sequence(items) = &seq {
            items.borrow_mut().clear();
        }
    }
}
