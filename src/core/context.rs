//! Pipeline context: a scope-aware diagnostic side channel.
//!
//! One [`PipelineContext`] accompanies each pipeline run. Operators stash
//! auxiliary outputs in it (detected contours, measured statistics) without
//! polluting the image return value. Entries are keyed by the current scope
//! path, so two operators writing the same key under different scopes do not
//! collide; re-writing the same scoped key refreshes the entry (last write
//! wins, intentionally, so a retried operator overwrites stale diagnostics).

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use image::DynamicImage;

/// An auxiliary value an operator can attach to the context.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer diagnostic.
    Int(i64),
    /// A floating-point diagnostic.
    Float(f64),
    /// A text diagnostic.
    Text(String),
    /// A list of integers (e.g. a contour hierarchy of parent indices).
    IntList(Vec<i64>),
    /// A list of pixel coordinates.
    Points(Vec<(u32, u32)>),
    /// A set of contours, each an ordered list of pixel coordinates.
    Contours(Vec<Vec<(u32, u32)>>),
}

/// Mutable, scope-aware side channel passed through every operator
/// invocation of one pipeline run.
///
/// The context is owned by a single run and discarded afterwards; it is not
/// shared across concurrent runs and carries no internal locking.
#[derive(Debug)]
pub struct PipelineContext {
    original: DynamicImage,
    scope_path: Vec<String>,
    info: BTreeMap<String, ContextValue>,
}

impl PipelineContext {
    /// Creates a context for one pipeline run over `original`.
    pub fn new(original: DynamicImage) -> Self {
        Self {
            original,
            scope_path: Vec::new(),
            info: BTreeMap::new(),
        }
    }

    /// Returns the original input image of the run.
    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    /// Inserts `value` under the current scope path plus `key`.
    ///
    /// Overwriting an existing entry at the same path is allowed; the last
    /// write wins.
    pub fn add_info(&mut self, key: &str, value: ContextValue) {
        let path = self.qualified(key);
        tracing::trace!(path = %path, "context info added");
        self.info.insert(path, value);
    }

    /// Looks up an entry by its full scope-qualified path.
    pub fn info(&self, path: &str) -> Option<&ContextValue> {
        self.info.get(path)
    }

    /// Returns all entries, keyed by scope-qualified path.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.info.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the current scope nesting depth.
    pub fn scope_depth(&self) -> usize {
        self.scope_path.len()
    }

    /// Enters a named scope, returning a guard that restores the previous
    /// scope path when dropped.
    ///
    /// The pop is tied to the guard's destructor, so it happens on every
    /// exit path, including early returns and panics.
    pub fn scope(&mut self, name: impl Into<String>) -> ContextScope<'_> {
        self.scope_path.push(name.into());
        ContextScope { ctx: self }
    }

    fn qualified(&self, key: &str) -> String {
        if self.scope_path.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.scope_path.join("/"), key)
        }
    }
}

/// RAII guard for a named context scope.
///
/// Dereferences to the underlying [`PipelineContext`], so `add_info` and
/// nested `scope` calls go through the guard while it is alive.
pub struct ContextScope<'a> {
    ctx: &'a mut PipelineContext,
}

impl Deref for ContextScope<'_> {
    type Target = PipelineContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.ctx.scope_path.pop();
    }
}
