// Resolution context: loop detection, visited path and step history

use std::sync::Arc;

use parking_lot::Mutex;
use wrapline_error::ResolutionResult;
use wrapline_types::Uri;

use super::UriPackageOrWrapper;

/// One recorded resolution step.
#[derive(Debug, Clone)]
pub struct ResolutionStep {
    pub source_uri: Uri,
    pub result: ResolutionResult<UriPackageOrWrapper>,
    pub description: Option<String>,
    pub sub_history: Vec<ResolutionStep>,
}

impl ResolutionStep {
    pub fn new(source_uri: Uri, result: ResolutionResult<UriPackageOrWrapper>) -> Self {
        ResolutionStep {
            source_uri,
            result,
            description: None,
            sub_history: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sub_history(mut self, sub_history: Vec<ResolutionStep>) -> Self {
        self.sub_history = sub_history;
        self
    }
}

#[derive(Debug, Default)]
struct PathState {
    /// URIs currently being resolved, innermost last
    active: Vec<Uri>,
    /// Every URI entered during this resolution, in first-visit order
    visited: Vec<Uri>,
}

/// Mutable state threaded through one resolution.
///
/// Loop detection state is shared with sub-history contexts so that nested
/// resolvers observe the same in-flight set, while each context records its
/// own step history.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    state: Arc<Mutex<PathState>>,
    history: Vec<ResolutionStep>,
    extension_cursor: Option<usize>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resolving(&self, uri: &Uri) -> bool {
        self.state.lock().active.contains(uri)
    }

    pub fn start_resolving(&self, uri: &Uri) {
        let mut state = self.state.lock();
        state.active.push(uri.clone());
        if !state.visited.contains(uri) {
            state.visited.push(uri.clone());
        }
    }

    pub fn stop_resolving(&self, uri: &Uri) {
        let mut state = self.state.lock();
        if let Some(position) = state.active.iter().rposition(|entry| entry == uri) {
            state.active.remove(position);
        }
    }

    /// URIs currently being resolved, outermost first
    pub fn active_path(&self) -> Vec<Uri> {
        self.state.lock().active.clone()
    }

    /// Every URI entered so far, in order. Survives `stop_resolving`.
    pub fn resolution_path(&self) -> Vec<Uri> {
        self.state.lock().visited.clone()
    }

    pub fn track_step(&mut self, step: ResolutionStep) {
        self.history.push(step);
    }

    pub fn history(&self) -> &[ResolutionStep] {
        &self.history
    }

    pub fn into_history(self) -> Vec<ResolutionStep> {
        self.history
    }

    /// Context sharing loop detection with `self` but recording into a
    /// fresh history.
    pub fn create_sub_history_context(&self) -> ResolutionContext {
        ResolutionContext {
            state: Arc::clone(&self.state),
            history: Vec::new(),
            extension_cursor: self.extension_cursor,
        }
    }

    /// Independent context seeded with the URIs currently in flight.
    ///
    /// Used for side resolutions (such as loading resolver extensions) that
    /// must not loop back into the outer resolution but whose own path must
    /// not leak into it.
    pub fn create_sub_context(&self) -> ResolutionContext {
        let active = self.state.lock().active.clone();
        ResolutionContext {
            state: Arc::new(Mutex::new(PathState {
                active,
                visited: Vec::new(),
            })),
            history: Vec::new(),
            extension_cursor: self.extension_cursor,
        }
    }

    /// Index of the first resolver extension eligible in this context
    pub fn extension_cursor(&self) -> usize {
        self.extension_cursor.unwrap_or(0)
    }

    pub fn with_extension_cursor(mut self, cursor: usize) -> Self {
        self.extension_cursor = Some(cursor);
        self
    }
}
