//! Errors raised while composing and constructing documents.

use std::fmt;

use thiserror::Error;

use crate::mark::Mark;

/// The payload shared by all errors that point into the source.
///
/// An error has an optional `context` (what was being done, and where it started) and an
/// optional `problem` (what went wrong, and where). The [`Display`] rendering puts them on
/// separate lines, followed by the rendering of their marks.
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkedError {
    /// What was being done when the problem was found.
    pub context: Option<String>,
    /// Where the context starts.
    pub context_mark: Option<Mark>,
    /// What went wrong.
    pub problem: Option<String>,
    /// Where the problem is.
    pub problem_mark: Option<Mark>,
    /// An additional note appended at the end of the message.
    pub note: Option<String>,
}

impl MarkedError {
    /// Create an error with only a problem.
    #[must_use]
    pub fn new(problem: impl Into<String>, problem_mark: Option<Mark>) -> Self {
        Self {
            problem: Some(problem.into()),
            problem_mark,
            ..Self::default()
        }
    }
}

impl fmt::Display for MarkedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = vec![];
        if let Some(context) = &self.context {
            lines.push(context.clone());
        }
        if let Some(context_mark) = &self.context_mark {
            // Only show the context mark if it tells something the problem mark does not.
            let redundant = self.problem.is_some()
                && self
                    .problem_mark
                    .as_ref()
                    .is_some_and(|problem_mark| problem_mark.same_position(context_mark));
            if !redundant {
                lines.push(context_mark.to_string());
            }
        }
        if let Some(problem) = &self.problem {
            lines.push(problem.clone());
        }
        if let Some(problem_mark) = &self.problem_mark {
            lines.push(problem_mark.to_string());
        }
        if let Some(note) = &self.note {
            lines.push(note.clone());
        }
        f.write_str(&lines.join("\n"))
    }
}

/// The category of a [`YamlError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`YamlError::Composer`].
    Composer,
    /// See [`YamlError::Constructor`].
    Constructor,
    /// See [`YamlError::Resolver`].
    Resolver,
    /// See [`YamlError::Parser`].
    Parser,
    /// See [`YamlError::Scanner`].
    Scanner,
    /// See [`YamlError::Emitter`].
    Emitter,
}

/// An error that happened while turning YAML into values (or back).
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum YamlError {
    /// An error while assembling nodes from events (undefined alias, duplicate anchor, ...).
    #[error("{0}")]
    Composer(MarkedError),
    /// An error while turning nodes into values.
    #[error("{0}")]
    Constructor(MarkedError),
    /// An invalid resolver registration.
    #[error("{0}")]
    Resolver(MarkedError),
    /// The event stream given to the composer is malformed.
    #[error("{0}")]
    Parser(MarkedError),
    /// The input text is not valid YAML. Reported by the parser.
    #[error("{0}")]
    Scanner(MarkedError),
    /// An error while rendering a value as YAML.
    #[error("{0}")]
    Emitter(String),
}

macro_rules! define_error_ctor (
    ($fn_name:ident, $variant:ident) => (
/// Create an error of this variant from a problem and the mark where it happened.
#[must_use]
pub fn $fn_name(problem: impl Into<String>, mark: Option<Mark>) -> Self {
    Self::$variant(MarkedError::new(problem, mark))
}
    );
);

impl YamlError {
    define_error_ctor!(composer, Composer);
    define_error_ctor!(constructor, Constructor);
    define_error_ctor!(resolver, Resolver);
    define_error_ctor!(parser, Parser);
    define_error_ctor!(scanner, Scanner);

    /// Set the context of the error (builder-style).
    ///
    /// This has no effect on [`YamlError::Emitter`] errors.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>, mark: Option<Mark>) -> Self {
        if let Some(marked) = self.marked_mut() {
            marked.context = Some(context.into());
            marked.context_mark = mark;
        }
        self
    }

    /// Set the note of the error (builder-style).
    ///
    /// This has no effect on [`YamlError::Emitter`] errors.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        if let Some(marked) = self.marked_mut() {
            marked.note = Some(note.into());
        }
        self
    }

    /// Return the category of the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Composer(_) => ErrorKind::Composer,
            Self::Constructor(_) => ErrorKind::Constructor,
            Self::Resolver(_) => ErrorKind::Resolver,
            Self::Parser(_) => ErrorKind::Parser,
            Self::Scanner(_) => ErrorKind::Scanner,
            Self::Emitter(_) => ErrorKind::Emitter,
        }
    }

    /// Return the marked payload of the error, if any.
    #[must_use]
    pub fn marked(&self) -> Option<&MarkedError> {
        match self {
            Self::Composer(e)
            | Self::Constructor(e)
            | Self::Resolver(e)
            | Self::Parser(e)
            | Self::Scanner(e) => Some(e),
            Self::Emitter(_) => None,
        }
    }

    fn marked_mut(&mut self) -> Option<&mut MarkedError> {
        match self {
            Self::Composer(e)
            | Self::Constructor(e)
            | Self::Resolver(e)
            | Self::Parser(e)
            | Self::Scanner(e) => Some(e),
            Self::Emitter(_) => None,
        }
    }

    /// Return the description of the problem.
    #[must_use]
    pub fn problem(&self) -> Option<&str> {
        match self {
            Self::Emitter(problem) => Some(problem),
            _ => self.marked().and_then(|e| e.problem.as_deref()),
        }
    }

    /// Return the mark where the problem is.
    #[must_use]
    pub fn problem_mark(&self) -> Option<&Mark> {
        self.marked().and_then(|e| e.problem_mark.as_ref())
    }

    /// Return the description of the context.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.marked().and_then(|e| e.context.as_deref())
    }

    /// Return the mark where the context starts.
    #[must_use]
    pub fn context_mark(&self) -> Option<&Mark> {
        self.marked().and_then(|e| e.context_mark.as_ref())
    }
}

/// A convenience alias for results in this crate.
pub type Result<T, E = YamlError> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{ErrorKind, YamlError};
    use crate::mark::Mark;

    #[test]
    fn message_lists_context_then_problem() {
        let err = YamlError::constructor("found unhashable key", Some(Mark::new("s", 5, 1, 2)))
            .with_context("while constructing a mapping", Some(Mark::new("s", 0, 0, 0)));
        assert_eq!(err.kind(), ErrorKind::Constructor);
        assert_eq!(
            err.to_string(),
            "while constructing a mapping\n\
             in \"s\", line 1, column 1\n\
             found unhashable key\n\
             in \"s\", line 2, column 3"
        );
    }

    #[test]
    fn context_mark_hidden_when_same_as_problem_mark() {
        let mark = Mark::new("s", 4, 0, 4);
        let err = YamlError::composer("found undefined alias 'x'", Some(mark.clone()))
            .with_context("while composing a node", Some(mark));
        assert_eq!(
            err.to_string(),
            "while composing a node\nfound undefined alias 'x'\nin \"s\", line 1, column 5"
        );
    }

    #[test]
    fn message_includes_snippet() {
        let source: Arc<str> = Arc::from("key: *nope\n");
        let mark = Mark::new("doc.yaml", 5, 0, 5).with_source(source);
        let err = YamlError::composer("found undefined alias 'nope'", Some(mark))
            .with_note("anchors must be defined before use");
        assert_eq!(
            err.to_string(),
            "found undefined alias 'nope'\n\
             in \"doc.yaml\", line 1, column 6:\n    key: *nope\n         ^\n\
             anchors must be defined before use"
        );
    }
}
