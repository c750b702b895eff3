//! Rendering surfaces and the document that owns them.
//!
//! The router never touches a DOM directly. The embedding shell supplies a
//! [`Document`] (location plus element lookup) whose elements are
//! [`Surface`]s. [`MemoryDocument`] and [`MemorySurface`] are complete
//! in-process implementations used by headless shells and tests.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

// ============================================================================
// ReplaceMode
// ============================================================================

/// How a surface's content is swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Only the body's inner content changes; the document shell (head,
    /// already-loaded bridge and router scripts) persists.
    BodyContent,
    /// The element's whole subtree is replaced.
    Subtree,
}

// ============================================================================
// Surface
// ============================================================================

/// An element that can receive page content.
pub trait Surface: Send + Sync {
    /// Element ID, if it has one.
    fn id(&self) -> Option<&str>;

    /// Returns `true` if this is the document's top-level body.
    fn is_document_body(&self) -> bool;

    /// Replaces the content with `markup`.
    fn replace_content(&self, markup: &str, mode: ReplaceMode);

    /// Attaches an external script element; it loads on its own.
    fn append_script(&self, src: &str);

    /// Returns the current markup.
    fn inner_html(&self) -> String;
}

impl fmt::Debug for dyn Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id())
            .field("is_document_body", &self.is_document_body())
            .finish()
    }
}

/// Returns the replacement mode appropriate for `surface`.
#[inline]
#[must_use]
pub fn replace_mode_for(surface: &dyn Surface) -> ReplaceMode {
    if surface.is_document_body() {
        ReplaceMode::BodyContent
    } else {
        ReplaceMode::Subtree
    }
}

// ============================================================================
// Document
// ============================================================================

/// The page hosting the router.
pub trait Document: Send + Sync {
    /// Current location (`href`).
    fn location(&self) -> String;

    /// Looks up an element by ID.
    fn element_by_id(&self, id: &str) -> Option<Arc<dyn Surface>>;

    /// The top-level body.
    fn body(&self) -> Arc<dyn Surface>;
}

// ============================================================================
// ContainerTarget
// ============================================================================

/// What [`Router::set_container`](super::Router::set_container) accepts.
#[derive(Clone)]
pub enum ContainerTarget {
    /// Element looked up by ID.
    Id(String),
    /// The document body.
    Body,
    /// An element handle.
    Surface(Arc<dyn Surface>),
}

impl fmt::Debug for ContainerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Body => f.write_str("Body"),
            Self::Surface(surface) => f.debug_tuple("Surface").field(&surface.id()).finish(),
        }
    }
}

impl From<&str> for ContainerTarget {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for ContainerTarget {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<Arc<dyn Surface>> for ContainerTarget {
    fn from(surface: Arc<dyn Surface>) -> Self {
        Self::Surface(surface)
    }
}

impl From<Arc<MemorySurface>> for ContainerTarget {
    fn from(surface: Arc<MemorySurface>) -> Self {
        Self::Surface(surface)
    }
}

// ============================================================================
// MemorySurface
// ============================================================================

#[derive(Debug, Default)]
struct SurfaceState {
    markup: String,
    scripts: Vec<String>,
    replacements: usize,
    last_mode: Option<ReplaceMode>,
}

/// In-memory [`Surface`].
#[derive(Debug)]
pub struct MemorySurface {
    id: Option<String>,
    is_body: bool,
    state: RwLock<SurfaceState>,
}

impl MemorySurface {
    /// Creates an element surface with `id`.
    #[must_use]
    pub fn element(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: Some(id.into()),
            is_body: false,
            state: RwLock::new(SurfaceState::default()),
        })
    }

    /// Creates a document body surface.
    #[must_use]
    pub fn body() -> Arc<Self> {
        Arc::new(Self {
            id: None,
            is_body: true,
            state: RwLock::new(SurfaceState::default()),
        })
    }

    /// External scripts attached since creation, in attach order.
    #[must_use]
    pub fn attached_scripts(&self) -> Vec<String> {
        self.state.read().scripts.clone()
    }

    /// Number of content replacements performed.
    #[must_use]
    pub fn replacement_count(&self) -> usize {
        self.state.read().replacements
    }

    /// Mode of the most recent replacement.
    #[must_use]
    pub fn last_mode(&self) -> Option<ReplaceMode> {
        self.state.read().last_mode
    }
}

impl Surface for MemorySurface {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_document_body(&self) -> bool {
        self.is_body
    }

    fn replace_content(&self, markup: &str, mode: ReplaceMode) {
        let mut state = self.state.write();
        state.markup = markup.to_string();
        state.replacements += 1;
        state.last_mode = Some(mode);
    }

    fn append_script(&self, src: &str) {
        let mut state = self.state.write();
        state.markup.push_str(&format!("<script src=\"{src}\"></script>"));
        state.scripts.push(src.to_string());
    }

    fn inner_html(&self) -> String {
        self.state.read().markup.clone()
    }
}

// ============================================================================
// MemoryDocument
// ============================================================================

/// In-memory [`Document`].
pub struct MemoryDocument {
    location: RwLock<String>,
    body: Arc<MemorySurface>,
    elements: RwLock<FxHashMap<String, Arc<MemorySurface>>>,
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("location", &*self.location.read())
            .field("elements", &self.elements.read().len())
            .finish_non_exhaustive()
    }
}

impl MemoryDocument {
    /// Creates an empty document at `location`.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            location: RwLock::new(location.into()),
            body: MemorySurface::body(),
            elements: RwLock::new(FxHashMap::default()),
        })
    }

    /// Adds (or returns the existing) element with `id`.
    pub fn add_element(&self, id: &str) -> Arc<MemorySurface> {
        Arc::clone(
            self.elements
                .write()
                .entry(id.to_string())
                .or_insert_with(|| MemorySurface::element(id)),
        )
    }

    /// Returns the concrete body surface.
    #[must_use]
    pub fn body_surface(&self) -> Arc<MemorySurface> {
        Arc::clone(&self.body)
    }

    /// Changes the location.
    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.write() = location.into();
    }
}

impl Document for MemoryDocument {
    fn location(&self) -> String {
        self.location.read().clone()
    }

    fn element_by_id(&self, id: &str) -> Option<Arc<dyn Surface>> {
        self.elements
            .read()
            .get(id)
            .map(|surface| Arc::clone(surface) as Arc<dyn Surface>)
    }

    fn body(&self) -> Arc<dyn Surface> {
        Arc::clone(&self.body) as Arc<dyn Surface>
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_mode_for_body_and_element() {
        let body = MemorySurface::body();
        let app = MemorySurface::element("app");
        assert_eq!(replace_mode_for(body.as_ref()), ReplaceMode::BodyContent);
        assert_eq!(replace_mode_for(app.as_ref()), ReplaceMode::Subtree);
    }

    #[test]
    fn test_append_script_lands_after_content() {
        let app = MemorySurface::element("app");
        app.replace_content("<p>x</p>", ReplaceMode::Subtree);
        app.append_script("vendor.js");

        assert_eq!(app.inner_html(), "<p>x</p><script src=\"vendor.js\"></script>");
        assert_eq!(app.attached_scripts(), vec!["vendor.js".to_string()]);
        assert_eq!(app.replacement_count(), 1);
    }

    #[test]
    fn test_document_lookup() {
        let doc = MemoryDocument::new("file:///app/index.html");
        let app = doc.add_element("app");
        let again = doc.add_element("app");

        assert!(Arc::ptr_eq(&app, &again));
        assert!(doc.element_by_id("app").is_some());
        assert!(doc.element_by_id("missing").is_none());
        assert!(doc.body().is_document_body());
    }
}
