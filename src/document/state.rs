//! Document state management for open component files.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tower_lsp::lsp_types::{Position, Url};

use super::region::{extract_regions, LanguageId, Region};
use super::text::LineIndex;
use super::translate::RegionOrigin;

/// An open host document.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    /// Server-side version: 1 on open, +1 on every full-text replace.
    pub version: u32,
    /// Version reported by the client, echoed back when publishing.
    pub client_version: i32,
    pub line_index: LineIndex,
    /// Ordered, non-overlapping regions of the current text.
    pub regions: Vec<Region>,
}

impl Document {
    fn new(uri: Url, text: String, version: u32, client_version: i32) -> Self {
        let line_index = LineIndex::new(text);
        let regions = extract_regions(&line_index);
        Self {
            uri,
            version,
            client_version,
            line_index,
            regions,
        }
    }

    pub fn text(&self) -> &str {
        self.line_index.text()
    }

    pub fn region(&self, language: LanguageId) -> Option<&Region> {
        self.regions.iter().find(|r| r.language == language)
    }

    /// Find the region owning a host position.
    pub fn region_at(&self, position: Position) -> Option<&Region> {
        let offset = self.line_index.position_to_offset(position)?;
        self.regions.iter().find(|r| r.contains(offset))
    }
}

/// One region of a document exposed under its own coordinate space.
#[derive(Debug, Clone)]
pub struct VirtualDocument {
    /// URI of the host document.
    pub uri: Url,
    pub language: LanguageId,
    /// Host document version this snapshot was cut from.
    pub source_version: u32,
    pub region: Region,
    /// Index over the region content only.
    pub line_index: LineIndex,
}

impl VirtualDocument {
    fn new(document: &Document, region: Region) -> Self {
        let text = &document.text()[region.span.clone()];
        Self {
            uri: document.uri.clone(),
            language: region.language,
            source_version: document.version,
            line_index: LineIndex::new(text),
            region,
        }
    }

    pub fn text(&self) -> &str {
        self.line_index.text()
    }

    pub fn origin(&self) -> RegionOrigin {
        self.region.origin
    }
}

/// Lifecycle notification delivered to store observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Added(Url),
    Changed(Url),
    Removed(Url),
}

impl DocumentEvent {
    pub fn uri(&self) -> &Url {
        match self {
            DocumentEvent::Added(uri) | DocumentEvent::Changed(uri) | DocumentEvent::Removed(uri) => {
                uri
            }
        }
    }
}

/// Receives document lifecycle events synchronously, after the store has
/// applied the change.
pub trait DocumentObserver: Send + Sync {
    fn on_document_event(&self, event: &DocumentEvent, store: &DocumentStore);
}

/// Storage for open documents and their virtual sub-documents.
pub struct DocumentStore {
    documents: DashMap<Url, Arc<Document>>,
    virtual_docs: DashMap<(Url, LanguageId), Arc<VirtualDocument>>,
    observers: RwLock<Vec<Arc<dyn DocumentObserver>>>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            virtual_docs: DashMap::new(),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn DocumentObserver>) {
        self.observers.write().push(observer);
    }

    /// Open a document at version 1.
    ///
    /// Re-opening a URI that is already open is applied as an update so
    /// observers never see two `Added` events for one URI.
    pub fn open(&self, uri: Url, text: String, client_version: i32) -> Arc<Document> {
        self.replace(uri, text, client_version)
    }

    /// Replace a document's text wholesale and bump its version.
    pub fn update(&self, uri: Url, text: String, client_version: i32) -> Arc<Document> {
        if !self.documents.contains_key(&uri) {
            tracing::warn!(%uri, "change for a document that was never opened");
        }
        self.replace(uri, text, client_version)
    }

    fn replace(&self, uri: Url, text: String, client_version: i32) -> Arc<Document> {
        let (document, event) = match self.documents.entry(uri.clone()) {
            Entry::Occupied(mut entry) => {
                let version = entry.get().version + 1;
                let document = Arc::new(Document::new(uri.clone(), text, version, client_version));
                entry.insert(Arc::clone(&document));
                (document, DocumentEvent::Changed(uri))
            }
            Entry::Vacant(entry) => {
                let document = Arc::new(Document::new(uri.clone(), text, 1, client_version));
                entry.insert(Arc::clone(&document));
                (document, DocumentEvent::Added(uri))
            }
        };

        self.evict(&document.uri);
        self.emit(&event);
        document
    }

    /// Close a document. Returns false when the URI was not open.
    pub fn close(&self, uri: &Url) -> bool {
        if self.documents.remove(uri).is_none() {
            return false;
        }
        self.evict(uri);
        self.emit(&DocumentEvent::Removed(uri.clone()));
        true
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.get(uri).map(|r| Arc::clone(&r))
    }

    pub fn version(&self, uri: &Url) -> Option<u32> {
        self.documents.get(uri).map(|r| r.version)
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    /// A missing region is a normal outcome, not an error.
    pub fn region(&self, uri: &Url, language: LanguageId) -> Option<Region> {
        self.get(uri)?.region(language).cloned()
    }

    /// Return the virtual document for a region, rebuilding it when the
    /// cached snapshot belongs to an older version.
    pub fn virtual_document(&self, uri: &Url, language: LanguageId) -> Option<Arc<VirtualDocument>> {
        let document = self.get(uri)?;
        let key = (uri.clone(), language);

        if let Some(cached) = self.virtual_docs.get(&key) {
            if cached.source_version == document.version {
                return Some(Arc::clone(&cached));
            }
        }

        let Some(region) = document.region(language) else {
            self.virtual_docs.remove(&key);
            return None;
        };

        let virtual_doc = Arc::new(VirtualDocument::new(&document, region.clone()));
        self.virtual_docs.insert(key, Arc::clone(&virtual_doc));
        Some(virtual_doc)
    }

    fn evict(&self, uri: &Url) {
        for language in LanguageId::ALL {
            self.virtual_docs.remove(&(uri.clone(), language));
        }
    }

    fn emit(&self, event: &DocumentEvent) {
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_document_event(event, self);
        }
    }
}
