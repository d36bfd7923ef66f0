//! Mahal component language server.
//!
//! A `.mahal` file holds a template, a `<script>` block and a `<style>`
//! block. Requests are answered by splitting the file into regions, exposing
//! each region as a virtual document in its own coordinate space, and routing
//! to the backend for that language.

use std::path::PathBuf;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

pub mod document;
pub mod error;
mod lsp;
pub mod service;
pub mod settings;

pub use document::{
    extract_regions, Document, DocumentEvent, DocumentObserver, DocumentStore, LanguageId,
    LineIndex, Region, RegionOrigin, TargetLine, VirtualDocument,
};
pub use error::Error;
pub use lsp::{
    server_capabilities, LanguageAdapter, LanguageManager, ScriptAdapter, StyleAdapter,
    TRIGGER_CHARACTERS,
};
pub use settings::{discover_compiler_options, CompilerOptions, EditorConfig};

pub struct Backend {
    client: Client,
    /// Every notification and request runs with this lock held, so each one
    /// sees fully applied document state.
    manager: Mutex<LanguageManager>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        let root = std::env::current_dir().unwrap_or_default();
        Self {
            client,
            manager: Mutex::new(LanguageManager::new(CompilerOptions::default(), root)),
        }
    }

    /// Validate a document and publish the combined diagnostics.
    async fn publish_diagnostics_for(&self, manager: &LanguageManager, uri: Url) {
        let Some(document) = manager.store().get(&uri) else {
            return;
        };
        let diagnostics = manager.validate(&uri);
        self.client
            .publish_diagnostics(uri, diagnostics, Some(document.client_version))
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        let cwd = std::env::current_dir().unwrap_or_default();
        let root: PathBuf = workspace_root.unwrap_or_else(|| cwd.clone());
        let (options, config_path) = settings::discover_compiler_options(&cwd, &root);
        tracing::info!(
            root = %root.display(),
            config = ?config_path,
            allow_js = options.allow_js,
            "initializing"
        );

        let mut manager = LanguageManager::new(options, root);
        if let Some(init) = params.initialization_options {
            manager.set_config(EditorConfig::from_value(init));
        }
        *self.manager.lock().await = manager;

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Mahal language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let manager = self.manager.lock().await;
        let doc = params.text_document;
        manager.open(doc.uri.clone(), doc.text, doc.version);
        self.publish_diagnostics_for(&manager, doc.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let manager = self.manager.lock().await;
        let uri = params.text_document.uri;
        manager.update(uri.clone(), change.text, params.text_document.version);
        self.publish_diagnostics_for(&manager, uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let manager = self.manager.lock().await;
        manager.close(&params.text_document.uri);
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.manager
            .lock()
            .await
            .set_config(EditorConfig::from_value(params.settings));
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let manager = self.manager.lock().await;
        let list = manager.complete(&position.text_document.uri, position.position);
        Ok(Some(CompletionResponse::List(list)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let manager = self.manager.lock().await;
        Ok(manager.hover(&position.text_document.uri, position.position))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let manager = self.manager.lock().await;
        let symbols = manager.document_symbols(&params.text_document.uri);
        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let position = params.text_document_position_params;
        let manager = self.manager.lock().await;
        let highlights = manager.document_highlight(&position.text_document.uri, position.position);
        Ok((!highlights.is_empty()).then_some(highlights))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let manager = self.manager.lock().await;
        Ok(Some(manager.format(&params.text_document.uri)))
    }

    async fn document_color(&self, params: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        let manager = self.manager.lock().await;
        Ok(manager.colors(&params.text_document.uri))
    }

    async fn color_presentation(
        &self,
        params: ColorPresentationParams,
    ) -> Result<Vec<ColorPresentation>> {
        let manager = self.manager.lock().await;
        Ok(manager.color_presentation(&params.text_document.uri, params.color, params.range))
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}
