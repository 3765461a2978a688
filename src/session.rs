//! Edit session: one open document plus its compiled timeline.
//!
//! Every source edit recompiles in full and atomically replaces the timeline
//! behind an `Arc`, so a preview or export loop holding the previous `Arc`
//! keeps rendering a consistent timeline until it picks up the new one.
//! Compilation never fails; problems surface as diagnostics.

use std::sync::Arc;

use crate::{
    compile,
    diag::{Diagnostic, SourceSpan},
    error::ScenemarkResult,
    model::Timeline,
    store::{IdGenerator, PROJECT_TTL, ProjectStore},
};

pub struct EditSession {
    source: String,
    timeline: Arc<Timeline>,
    diagnostics: Vec<Diagnostic>,
}

impl EditSession {
    pub fn new(initial_source: impl Into<String>) -> Self {
        let source = initial_source.into();
        let (timeline, diagnostics) = compile::compile_source(&source);
        Self {
            source,
            timeline: Arc::new(timeline),
            diagnostics,
        }
    }

    /// Load a stored project. A missing or expired id, or a store failure,
    /// degrades to an empty document with a warning diagnostic.
    pub fn open(store: &dyn ProjectStore, id: &str) -> Self {
        let message = match store.get(id) {
            Ok(Some(source)) => return Self::new(source),
            Ok(None) => format!("project '{id}' was not found; starting an empty document"),
            Err(e) => format!("could not load project '{id}' ({e}); starting an empty document"),
        };
        let mut session = Self::new("");
        session
            .diagnostics
            .insert(0, Diagnostic::warning(message, SourceSpan::line(1)));
        session
    }

    /// Replace the document and recompile. Readers of the previous timeline
    /// `Arc` are unaffected.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        let (timeline, diagnostics) = compile::compile_source(&self.source);
        self.timeline = Arc::new(timeline);
        self.diagnostics = diagnostics;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn save(&self, store: &dyn ProjectStore, id: &str) -> ScenemarkResult<()> {
        store.set(id, &self.source, PROJECT_TTL)
    }

    /// Save under a freshly generated id and return it.
    pub fn save_new(
        &self,
        store: &dyn ProjectStore,
        ids: &dyn IdGenerator,
    ) -> ScenemarkResult<String> {
        let id = ids.next_id();
        self.save(store, &id)?;
        Ok(id)
    }
}
