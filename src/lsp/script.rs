//! Adapter for `<script>` regions.

use std::ops::Range as Span;
use std::sync::Arc;

use parking_lot::Mutex;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionList, CompletionTextEdit, Diagnostic, DiagnosticSeverity,
    DocumentHighlight, DocumentHighlightKind, Hover, HoverContents, Location, MarkupContent,
    MarkupKind, Position, SymbolInformation, TextEdit, Url,
};

use super::adapter::LanguageAdapter;
use crate::document::{DocumentStore, LanguageId, TargetLine, VirtualDocument};
use crate::error::Result;
use crate::service::script::{
    document_uri, is_ident_byte, script_file_name, ScriptHost, ScriptProgramHost, ScriptService,
};

const SOURCE: &str = "javascript";

pub struct ScriptAdapter {
    store: Arc<DocumentStore>,
    host: Arc<ScriptProgramHost>,
    service: Mutex<Box<dyn ScriptService>>,
}

/// Identifier characters before the cursor, which a completion replaces.
fn word_before(text: &str, offset: usize) -> Span<usize> {
    let start = offset
        - text.as_bytes()[..offset]
            .iter()
            .rev()
            .take_while(|b| is_ident_byte(**b))
            .count();
    start..offset
}

/// Short display name for a synthetic script file.
fn file_label(file_name: &str) -> String {
    document_uri(file_name)
        .and_then(|uri| {
            uri.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_else(|| file_name.to_string())
}

impl ScriptAdapter {
    pub fn new(
        store: Arc<DocumentStore>,
        host: Arc<ScriptProgramHost>,
        service: Box<dyn ScriptService>,
    ) -> Self {
        Self {
            store,
            host,
            service: Mutex::new(service),
        }
    }

    fn document(&self, uri: &Url) -> Option<Arc<VirtualDocument>> {
        self.store.virtual_document(uri, LanguageId::Script)
    }

    /// The script document and the query position as a local byte offset.
    fn locate(&self, uri: &Url, position: Position) -> Option<(Arc<VirtualDocument>, usize)> {
        let doc = self.document(uri)?;
        let local = doc.origin().to_local(position)?;
        let offset = doc.line_index.position_to_offset(local)?;
        Some((doc, offset))
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&mut dyn ScriptService, &dyn ScriptHost) -> Result<T>,
    ) -> Result<T> {
        let mut service = self.service.lock();
        f(service.as_mut(), self.host.as_ref())
    }
}

impl LanguageAdapter for ScriptAdapter {
    fn language(&self) -> LanguageId {
        LanguageId::Script
    }

    fn complete(&self, uri: &Url, position: Position) -> Result<CompletionList> {
        let Some((doc, offset)) = self.locate(uri, position) else {
            return Ok(CompletionList::default());
        };
        let file_name = script_file_name(uri);
        let entries = self.with_service(|service, host| {
            service.completions_at(host, &file_name, offset)
        })?;

        let local = doc.line_index.span_to_range(&word_before(doc.text(), offset));
        let range = doc.origin().range_to_host(local, TargetLine::Pin(position));
        let items = entries
            .into_iter()
            .map(|entry| CompletionItem {
                detail: Some(match &entry.source {
                    Some(file) => format!("{} from {}", entry.kind.label(), file_label(file)),
                    None => entry.kind.label().to_string(),
                }),
                kind: Some(entry.kind.completion_kind()),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range,
                    new_text: entry.name.clone(),
                })),
                label: entry.name,
                ..Default::default()
            })
            .collect();

        Ok(CompletionList {
            is_incomplete: false,
            items,
        })
    }

    fn hover(&self, uri: &Url, position: Position) -> Result<Option<Hover>> {
        let Some((doc, offset)) = self.locate(uri, position) else {
            return Ok(None);
        };
        let file_name = script_file_name(uri);
        let info = self.with_service(|service, host| {
            service.quick_info_at(host, &file_name, offset)
        })?;

        Ok(info.map(|info| {
            let local = doc.line_index.span_to_range(&info.span);
            Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: format!(
                        "```typescript\n({}) {}\n```\n\n`{}`",
                        info.kind.label(),
                        info.name,
                        info.declaration
                    ),
                }),
                range: Some(doc.origin().range_to_host(local, TargetLine::Pin(position))),
            }
        }))
    }

    fn validate(&self, uri: &Url) -> Result<Vec<Diagnostic>> {
        let Some(doc) = self.document(uri) else {
            return Ok(Vec::new());
        };
        let file_name = script_file_name(uri);
        let diagnostics =
            self.with_service(|service, host| service.diagnostics(host, &file_name))?;

        Ok(diagnostics
            .into_iter()
            .map(|d| Diagnostic {
                range: doc
                    .origin()
                    .range_to_host(doc.line_index.span_to_range(&d.span), TargetLine::Delta),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(SOURCE.to_string()),
                message: d.message,
                ..Default::default()
            })
            .collect())
    }

    #[allow(deprecated)]
    fn document_symbols(&self, uri: &Url) -> Result<Vec<SymbolInformation>> {
        let Some(doc) = self.document(uri) else {
            return Ok(Vec::new());
        };
        let file_name = script_file_name(uri);
        let items = self.with_service(|service, host| service.navigation_items(host, &file_name))?;

        Ok(items
            .into_iter()
            .map(|item| SymbolInformation {
                name: item.name,
                kind: item.kind.symbol_kind(),
                tags: None,
                deprecated: None,
                location: Location {
                    uri: uri.clone(),
                    range: doc
                        .origin()
                        .range_to_host(doc.line_index.span_to_range(&item.span), TargetLine::Delta),
                },
                container_name: None,
            })
            .collect())
    }

    fn document_highlight(&self, uri: &Url, position: Position) -> Result<Vec<DocumentHighlight>> {
        let Some((doc, offset)) = self.locate(uri, position) else {
            return Ok(Vec::new());
        };
        let file_name = script_file_name(uri);
        let spans = self.with_service(|service, host| {
            service.highlights(host, &file_name, offset)
        })?;

        Ok(spans
            .iter()
            .map(|span| DocumentHighlight {
                range: doc
                    .origin()
                    .range_to_host(doc.line_index.span_to_range(span), TargetLine::Delta),
                kind: Some(DocumentHighlightKind::TEXT),
            })
            .collect())
    }
}
