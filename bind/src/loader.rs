//! Entry points turning YAML text (or events) into values.

use crate::{
    composer::Composer,
    constructor::Constructor,
    error::Result,
    event::{EventSource, ParserEvents},
    mark::DEFAULT_STREAM_NAME,
    node::Document,
    registry::Registry,
    value::Value,
};

/// Options for loading a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderOptions {
    name: String,
}

impl LoaderOptions {
    /// Set the name of the stream, as reported in error messages (e.g. a file name).
    ///
    /// Defaults to `<unicode string>`.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Return the name of the stream.
    #[must_use]
    pub fn stream_name(&self) -> &str {
        &self.name
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_STREAM_NAME.to_string(),
        }
    }
}

/// Loads the documents of an event stream, one at a time.
///
/// Each document is composed, then built by a fresh [`Constructor`].
#[derive(Debug)]
pub struct Loader<'r, S> {
    composer: Composer<'r, S>,
    registry: &'r Registry,
}

impl<'input, 'r> Loader<'r, ParserEvents<'input>> {
    /// Create a loader parsing `input`.
    #[must_use]
    pub fn load_from_str(
        input: &'input str,
        registry: &'r Registry,
        options: &LoaderOptions,
    ) -> Self {
        Self::new(ParserEvents::new(input, &options.name), registry)
    }
}

impl<'r, S: EventSource> Loader<'r, S> {
    /// Create a loader reading `events`.
    pub fn new(events: S, registry: &'r Registry) -> Self {
        Self {
            composer: Composer::new(events, registry),
            registry,
        }
    }

    /// Return whether there is another document in the stream.
    ///
    /// # Errors
    /// Returns an error if the input is not valid YAML.
    pub fn check_data(&mut self) -> Result<bool> {
        self.composer.check_node()
    }

    /// Load the next document of the stream, if any.
    ///
    /// # Errors
    /// Returns an error if the input is not valid YAML, or if the document cannot be composed or
    /// constructed.
    pub fn get_data(&mut self) -> Result<Option<Value>> {
        self.composer
            .get_node()?
            .map(|document| self.construct(&document))
            .transpose()
    }

    /// Load the only document of the stream. An empty stream is null.
    ///
    /// # Errors
    /// Returns an error if the stream holds more than one document, or if [`Self::get_data`]
    /// would.
    pub fn get_single_data(&mut self) -> Result<Value> {
        match self.composer.get_single_node()? {
            Some(document) => self.construct(&document),
            None => Ok(Value::Null),
        }
    }

    /// Compose the next document of the stream without constructing it.
    ///
    /// # Errors
    /// Returns an error if the input is not valid YAML, or if the document cannot be composed.
    pub fn get_node(&mut self) -> Result<Option<Document>> {
        self.composer.get_node()
    }

    fn construct(&self, document: &Document) -> Result<Value> {
        Constructor::new(self.registry, document).construct_document()
    }
}

impl<S: EventSource> Iterator for Loader<'_, S> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_data().transpose()
    }
}

/// Load a single document with YAML 1.1 semantics.
///
/// ```
/// let value = saphyr_bind::load("a: &x [1, 2]\nb: *x\n").unwrap();
/// assert!(value.get("a").unwrap().ptr_eq(&value.get("b").unwrap()));
/// ```
///
/// # Errors
/// Returns an error if `input` is not valid YAML, holds more than one document, or cannot be
/// constructed.
pub fn load(input: &str) -> Result<Value> {
    load_with(input, &Registry::default(), &LoaderOptions::default())
}

/// Load a single document with the given registry.
///
/// # Errors
/// See [`load`].
pub fn load_with(input: &str, registry: &Registry, options: &LoaderOptions) -> Result<Value> {
    Loader::load_from_str(input, registry, options).get_single_data()
}

/// Load all the documents of a stream with YAML 1.1 semantics.
///
/// # Errors
/// Returns the first error met. Documents preceding it are discarded.
pub fn load_all(input: &str) -> Result<Vec<Value>> {
    load_all_with(input, &Registry::default(), &LoaderOptions::default())
}

/// Load all the documents of a stream with the given registry.
///
/// # Errors
/// See [`load_all`].
pub fn load_all_with(
    input: &str,
    registry: &Registry,
    options: &LoaderOptions,
) -> Result<Vec<Value>> {
    Loader::load_from_str(input, registry, options).collect()
}

/// Compose the single document of a stream into its node graph.
///
/// # Errors
/// Returns an error if `input` is not valid YAML, holds more than one document, or cannot be
/// composed.
pub fn compose(input: &str, registry: &Registry, options: &LoaderOptions) -> Result<Document> {
    let mut composer = Composer::new(ParserEvents::new(input, &options.name), registry);
    Ok(composer.get_single_node()?.unwrap_or_default())
}

/// Compose every document of a stream.
///
/// # Errors
/// Returns the first error met.
pub fn compose_all(
    input: &str,
    registry: &Registry,
    options: &LoaderOptions,
) -> Result<Vec<Document>> {
    let mut composer = Composer::new(ParserEvents::new(input, &options.name), registry);
    let mut documents = vec![];
    while let Some(document) = composer.get_node()? {
        documents.push(document);
    }
    Ok(documents)
}

/// Build the value of an already composed document.
///
/// # Errors
/// Returns the first error raised by a tag constructor.
pub fn construct_document(document: &Document, registry: &Registry) -> Result<Value> {
    Constructor::new(registry, document).construct_document()
}
