//! The capability interface every embedded-language adapter implements.
//!
//! Adapters take and return host coordinates. Everything in between (finding
//! the region, translating into local space, calling the backend, mapping
//! ranges back) is the adapter's business.

use tower_lsp::lsp_types::{
    Color, ColorInformation, ColorPresentation, CompletionList, Diagnostic, DocumentHighlight,
    Hover, Position, Range, SymbolInformation, TextEdit, Url,
};

use crate::document::LanguageId;
use crate::error::Result;
use crate::settings::EditorConfig;

pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> LanguageId;

    fn complete(&self, uri: &Url, position: Position) -> Result<CompletionList>;

    fn hover(&self, uri: &Url, position: Position) -> Result<Option<Hover>>;

    /// Empty when the document has no region for this language.
    fn validate(&self, uri: &Url) -> Result<Vec<Diagnostic>>;

    fn document_symbols(&self, uri: &Url) -> Result<Vec<SymbolInformation>>;

    fn document_highlight(&self, uri: &Url, position: Position) -> Result<Vec<DocumentHighlight>>;

    fn format(&self, _uri: &Url, _config: &EditorConfig) -> Result<Vec<TextEdit>> {
        Ok(Vec::new())
    }

    fn colors(&self, _uri: &Url) -> Result<Vec<ColorInformation>> {
        Ok(Vec::new())
    }

    fn color_presentation(
        &self,
        _uri: &Url,
        _color: Color,
        _range: Range,
    ) -> Result<Vec<ColorPresentation>> {
        Ok(Vec::new())
    }
}
