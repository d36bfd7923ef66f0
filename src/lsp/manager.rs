//! Dispatch of protocol requests to language adapters.

use std::path::PathBuf;
use std::sync::Arc;

use tower_lsp::lsp_types::{
    Color, ColorInformation, ColorPresentation, CompletionList, Diagnostic, DocumentHighlight,
    Hover, Position, Range, SymbolInformation, TextEdit, Url,
};

use super::adapter::LanguageAdapter;
use super::script::ScriptAdapter;
use super::style::StyleAdapter;
use crate::document::{Document, DocumentStore, LanguageId};
use crate::error::Result;
use crate::service::css::{CssService, StylesheetService};
use crate::service::script::{LexicalScriptService, ScriptProgramHost, ScriptService};
use crate::settings::{CompilerOptions, EditorConfig};

/// Owns the document store, the script program host and one adapter per
/// embedded language.
///
/// Position-based requests go to the adapter whose region contains the
/// position; document-wide requests are answered by every adapter and
/// concatenated. Failures and results computed against a version that is no
/// longer current come back as empty responses.
pub struct LanguageManager {
    store: Arc<DocumentStore>,
    script_host: Arc<ScriptProgramHost>,
    style: StyleAdapter,
    script: ScriptAdapter,
    config: EditorConfig,
}

impl LanguageManager {
    /// A manager with the built-in backends.
    pub fn new(options: CompilerOptions, root: PathBuf) -> Self {
        Self::with_services(
            options,
            root,
            Box::new(CssService::new()),
            Box::new(LexicalScriptService::new()),
        )
    }

    pub fn with_services(
        options: CompilerOptions,
        root: PathBuf,
        style_service: Box<dyn StylesheetService>,
        script_service: Box<dyn ScriptService>,
    ) -> Self {
        let store = Arc::new(DocumentStore::new());
        let script_host = Arc::new(ScriptProgramHost::new(options, root));
        store.subscribe(script_host.clone());

        Self {
            style: StyleAdapter::new(Arc::clone(&store), style_service),
            script: ScriptAdapter::new(
                Arc::clone(&store),
                Arc::clone(&script_host),
                script_service,
            ),
            store,
            script_host,
            config: EditorConfig::default(),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn script_host(&self) -> &ScriptProgramHost {
        &self.script_host
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EditorConfig) {
        tracing::debug!(?config, "editor configuration updated");
        self.config = config;
    }

    fn adapter(&self, language: LanguageId) -> &dyn LanguageAdapter {
        match language {
            LanguageId::Style => &self.style,
            LanguageId::Script => &self.script,
        }
    }

    fn adapters(&self) -> impl Iterator<Item = &dyn LanguageAdapter> {
        LanguageId::ALL.into_iter().map(|language| self.adapter(language))
    }

    /// The adapter owning the region under a host position.
    fn adapter_at(&self, uri: &Url, position: Position) -> Option<&dyn LanguageAdapter> {
        let document = self.store.get(uri)?;
        let region = document.region_at(position)?;
        Some(self.adapter(region.language))
    }

    /// Run one adapter call, turning failures and stale results into the
    /// empty response.
    fn run<T: Default>(
        &self,
        uri: &Url,
        feature: &'static str,
        adapter: &dyn LanguageAdapter,
        call: impl FnOnce(&dyn LanguageAdapter) -> Result<T>,
    ) -> T {
        let Some(version) = self.store.version(uri) else {
            return T::default();
        };
        let language = adapter.language().as_str();

        match call(adapter) {
            Ok(value) if self.store.version(uri) == Some(version) => value,
            Ok(_) => {
                tracing::debug!(%uri, feature, language, version, "discarding stale result");
                T::default()
            }
            Err(e) => {
                tracing::warn!(%uri, feature, language, error = %e, "request failed");
                T::default()
            }
        }
    }

    pub fn open(&self, uri: Url, text: String, client_version: i32) -> Arc<Document> {
        let document = self.store.open(uri, text, client_version);
        tracing::debug!(
            uri = %document.uri,
            version = document.version,
            regions = document.regions.len(),
            "opened document"
        );
        document
    }

    pub fn update(&self, uri: Url, text: String, client_version: i32) -> Arc<Document> {
        let document = self.store.update(uri, text, client_version);
        tracing::debug!(uri = %document.uri, version = document.version, "updated document");
        document
    }

    pub fn close(&self, uri: &Url) -> bool {
        let closed = self.store.close(uri);
        tracing::debug!(%uri, closed, "closed document");
        closed
    }

    pub fn complete(&self, uri: &Url, position: Position) -> CompletionList {
        let Some(adapter) = self.adapter_at(uri, position) else {
            return CompletionList::default();
        };
        self.run(uri, "completion", adapter, |a| a.complete(uri, position))
    }

    pub fn hover(&self, uri: &Url, position: Position) -> Option<Hover> {
        let adapter = self.adapter_at(uri, position)?;
        self.run(uri, "hover", adapter, |a| a.hover(uri, position))
    }

    pub fn document_highlight(&self, uri: &Url, position: Position) -> Vec<DocumentHighlight> {
        let Some(adapter) = self.adapter_at(uri, position) else {
            return Vec::new();
        };
        self.run(uri, "documentHighlight", adapter, |a| {
            a.document_highlight(uri, position)
        })
    }

    pub fn validate(&self, uri: &Url) -> Vec<Diagnostic> {
        self.adapters()
            .flat_map(|adapter| self.run(uri, "diagnostics", adapter, |a| a.validate(uri)))
            .collect()
    }

    pub fn document_symbols(&self, uri: &Url) -> Vec<SymbolInformation> {
        self.adapters()
            .flat_map(|adapter| {
                self.run(uri, "documentSymbol", adapter, |a| a.document_symbols(uri))
            })
            .collect()
    }

    pub fn format(&self, uri: &Url) -> Vec<TextEdit> {
        self.adapters()
            .flat_map(|adapter| {
                self.run(uri, "formatting", adapter, |a| a.format(uri, &self.config))
            })
            .collect()
    }

    pub fn colors(&self, uri: &Url) -> Vec<ColorInformation> {
        self.adapters()
            .flat_map(|adapter| self.run(uri, "documentColor", adapter, |a| a.colors(uri)))
            .collect()
    }

    pub fn color_presentation(
        &self,
        uri: &Url,
        color: Color,
        range: Range,
    ) -> Vec<ColorPresentation> {
        let Some(adapter) = self.adapter_at(uri, range.start) else {
            return Vec::new();
        };
        self.run(uri, "colorPresentation", adapter, |a| {
            a.color_presentation(uri, color, range)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::VirtualDocument;
    use crate::error::Error;
    use crate::service::css::{StyleFormatOptions, Stylesheet};
    use std::sync::OnceLock;
    use tower_lsp::lsp_types::DocumentHighlightKind;

    fn uri() -> Url {
        Url::parse("file:///project/app.mahal").unwrap()
    }

    fn manager() -> LanguageManager {
        LanguageManager::new(CompilerOptions::default(), std::env::temp_dir())
    }

    const APP: &str = "<template>\n  <p>{{ msg }}</p>\n</template>\n<script>\nconst msg = 'hi';\n</script>\n<style>\np { color: red }\n</style>\n";

    #[test]
    fn routes_by_region() {
        let m = manager();
        m.open(uri(), APP.to_string(), 0);

        let hover = m.hover(&uri(), Position::new(4, 7)).unwrap();
        let tower_lsp::lsp_types::HoverContents::Markup(content) = hover.contents else {
            panic!("expected markdown");
        };
        assert!(content.value.contains("(const) msg"));

        let list = m.complete(&uri(), Position::new(7, 11));
        assert!(list.items.iter().any(|i| i.label == "red"));
    }

    #[test]
    fn markup_positions_are_neutral() {
        let m = manager();
        m.open(uri(), APP.to_string(), 0);
        let position = Position::new(1, 8);
        assert!(m.hover(&uri(), position).is_none());
        assert!(m.complete(&uri(), position).items.is_empty());
        assert!(m.document_highlight(&uri(), position).is_empty());
    }

    #[test]
    fn document_requests_combine_adapters() {
        let m = manager();
        m.open(uri(), APP.to_string(), 0);
        let names: Vec<_> = m
            .document_symbols(&uri())
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["p", "msg"]);
        assert_eq!(m.colors(&uri()).len(), 1);
    }

    #[test]
    fn unknown_documents_are_neutral() {
        let m = manager();
        assert!(m.validate(&uri()).is_empty());
        assert!(m.format(&uri()).is_empty());
        assert!(m.hover(&uri(), Position::new(0, 0)).is_none());
        assert!(!m.close(&uri()));
    }

    /// Fails most queries. Completion edits the document it was asked about,
    /// as if a change landed while the backend was busy.
    #[derive(Default)]
    struct Misbehaving {
        store: Arc<OnceLock<Arc<DocumentStore>>>,
    }

    impl StylesheetService for Misbehaving {
        fn parse_stylesheet(&self, _: &VirtualDocument) -> Stylesheet {
            Stylesheet::default()
        }

        fn do_complete(
            &self,
            doc: &VirtualDocument,
            _: Position,
            _: &Stylesheet,
        ) -> Result<CompletionList> {
            if let Some(store) = self.store.get() {
                store.update(doc.uri.clone(), "<style></style>".into(), 99);
            }
            Ok(CompletionList {
                is_incomplete: false,
                items: vec![Default::default()],
            })
        }

        fn do_hover(&self, _: &VirtualDocument, _: Position, _: &Stylesheet) -> Result<Option<Hover>> {
            Err(Error::backend("css", "boom"))
        }

        fn do_validation(&self, _: &VirtualDocument, _: &Stylesheet) -> Result<Vec<Diagnostic>> {
            Err(Error::backend("css", "boom"))
        }

        fn find_document_symbols(
            &self,
            _: &VirtualDocument,
            _: &Stylesheet,
        ) -> Result<Vec<SymbolInformation>> {
            Ok(Vec::new())
        }

        fn find_document_highlights(
            &self,
            _: &VirtualDocument,
            position: Position,
            _: &Stylesheet,
        ) -> Result<Vec<DocumentHighlight>> {
            Ok(vec![DocumentHighlight {
                range: Range::new(position, position),
                kind: Some(DocumentHighlightKind::TEXT),
            }])
        }

        fn find_document_colors(
            &self,
            _: &VirtualDocument,
            _: &Stylesheet,
        ) -> Result<Vec<ColorInformation>> {
            Ok(Vec::new())
        }

        fn get_color_presentations(
            &self,
            _: &VirtualDocument,
            _: &Stylesheet,
            _: Color,
            _: Range,
        ) -> Result<Vec<ColorPresentation>> {
            Ok(Vec::new())
        }

        fn format(&self, _: &VirtualDocument, _: &StyleFormatOptions) -> Result<String> {
            Err(Error::format("css", "boom"))
        }
    }

    fn misbehaving_manager() -> LanguageManager {
        let service = Misbehaving::default();
        let slot = Arc::clone(&service.store);
        let m = LanguageManager::with_services(
            CompilerOptions::default(),
            std::env::temp_dir(),
            Box::new(service),
            Box::new(LexicalScriptService::new()),
        );
        let _ = slot.set(Arc::clone(&m.store));
        m
    }

    #[test]
    fn backend_failures_become_empty_responses() {
        let m = misbehaving_manager();
        m.open(uri(), "<style>\np {}\n</style>".into(), 0);
        assert!(m.hover(&uri(), Position::new(1, 0)).is_none());
        assert!(m.validate(&uri()).is_empty());
        assert!(m.format(&uri()).is_empty());
        assert_eq!(m.document_highlight(&uri(), Position::new(1, 0)).len(), 1);
    }

    #[test]
    fn stale_results_are_discarded() {
        let m = misbehaving_manager();
        m.open(uri(), "<style>\np {}\n</style>".into(), 0);
        assert!(m.complete(&uri(), Position::new(1, 0)).items.is_empty());
        assert_eq!(m.store().version(&uri()), Some(2));
    }
}
