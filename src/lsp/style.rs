//! Adapter for `<style>` regions.

use std::sync::Arc;

use tower_lsp::lsp_types::{
    Color, ColorInformation, ColorPresentation, CompletionItem, CompletionList,
    CompletionTextEdit, Diagnostic, DocumentHighlight, Hover, Position, Range, SymbolInformation,
    TextEdit, Url,
};

use super::adapter::LanguageAdapter;
use crate::document::{DocumentStore, LanguageId, RegionOrigin, TargetLine, VirtualDocument};
use crate::error::Result;
use crate::service::css::{StyleFormatOptions, StylesheetService};
use crate::settings::EditorConfig;

pub struct StyleAdapter {
    store: Arc<DocumentStore>,
    service: Box<dyn StylesheetService>,
}

fn remap_completion(item: &mut CompletionItem, origin: RegionOrigin, query: Position) {
    let pin = TargetLine::Pin(query);
    match &mut item.text_edit {
        Some(CompletionTextEdit::Edit(edit)) => edit.range = origin.range_to_host(edit.range, pin),
        Some(CompletionTextEdit::InsertAndReplace(edit)) => {
            edit.insert = origin.range_to_host(edit.insert, pin);
            edit.replace = origin.range_to_host(edit.replace, pin);
        }
        None => {}
    }
    for edit in item.additional_text_edits.iter_mut().flatten() {
        edit.range = origin.range_to_host(edit.range, TargetLine::Delta);
    }
}

impl StyleAdapter {
    pub fn new(store: Arc<DocumentStore>, service: Box<dyn StylesheetService>) -> Self {
        Self { store, service }
    }

    fn document(&self, uri: &Url) -> Option<Arc<VirtualDocument>> {
        self.store.virtual_document(uri, LanguageId::Style)
    }

    /// The style document and the query position in its local space.
    fn locate(&self, uri: &Url, position: Position) -> Option<(Arc<VirtualDocument>, Position)> {
        let doc = self.document(uri)?;
        let local = doc.origin().to_local(position)?;
        Some((doc, local))
    }
}

impl LanguageAdapter for StyleAdapter {
    fn language(&self) -> LanguageId {
        LanguageId::Style
    }

    fn complete(&self, uri: &Url, position: Position) -> Result<CompletionList> {
        let Some((doc, local)) = self.locate(uri, position) else {
            return Ok(CompletionList::default());
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let mut list = self.service.do_complete(&doc, local, &sheet)?;
        for item in &mut list.items {
            remap_completion(item, doc.origin(), position);
        }
        Ok(list)
    }

    fn hover(&self, uri: &Url, position: Position) -> Result<Option<Hover>> {
        let Some((doc, local)) = self.locate(uri, position) else {
            return Ok(None);
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let hover = self.service.do_hover(&doc, local, &sheet)?;
        Ok(hover.map(|mut hover| {
            hover.range = hover
                .range
                .map(|r| doc.origin().range_to_host(r, TargetLine::Pin(position)));
            hover
        }))
    }

    fn validate(&self, uri: &Url) -> Result<Vec<Diagnostic>> {
        let Some(doc) = self.document(uri) else {
            return Ok(Vec::new());
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let mut diagnostics = self.service.do_validation(&doc, &sheet)?;
        for diagnostic in &mut diagnostics {
            diagnostic.range = doc.origin().range_to_host(diagnostic.range, TargetLine::Delta);
        }
        Ok(diagnostics)
    }

    fn document_symbols(&self, uri: &Url) -> Result<Vec<SymbolInformation>> {
        let Some(doc) = self.document(uri) else {
            return Ok(Vec::new());
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let mut symbols = self.service.find_document_symbols(&doc, &sheet)?;
        for symbol in &mut symbols {
            symbol.location.range =
                doc.origin().range_to_host(symbol.location.range, TargetLine::Delta);
        }
        Ok(symbols)
    }

    fn document_highlight(&self, uri: &Url, position: Position) -> Result<Vec<DocumentHighlight>> {
        let Some((doc, local)) = self.locate(uri, position) else {
            return Ok(Vec::new());
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let mut highlights = self.service.find_document_highlights(&doc, local, &sheet)?;
        for highlight in &mut highlights {
            highlight.range = doc.origin().range_to_host(highlight.range, TargetLine::Delta);
        }
        Ok(highlights)
    }

    fn format(&self, uri: &Url, config: &EditorConfig) -> Result<Vec<TextEdit>> {
        if !config.style.format.enable {
            return Ok(Vec::new());
        }
        let (Some(host), Some(doc)) = (self.store.get(uri), self.document(uri)) else {
            return Ok(Vec::new());
        };

        let options = StyleFormatOptions {
            tab_size: config.tab_size,
            insert_spaces: config.insert_spaces,
        };
        let formatted = self.service.format(&doc, &options)?;
        // Content only: the delimiting tags are never touched.
        let span = doc.region.start()..doc.region.end();
        Ok(vec![TextEdit {
            range: host.line_index.span_to_range(&span),
            new_text: format!("\n{formatted}"),
        }])
    }

    fn colors(&self, uri: &Url) -> Result<Vec<ColorInformation>> {
        let Some(doc) = self.document(uri) else {
            return Ok(Vec::new());
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let mut colors = self.service.find_document_colors(&doc, &sheet)?;
        for info in &mut colors {
            info.range = doc.origin().range_to_host(info.range, TargetLine::Delta);
        }
        Ok(colors)
    }

    fn color_presentation(
        &self,
        uri: &Url,
        color: Color,
        range: Range,
    ) -> Result<Vec<ColorPresentation>> {
        let Some(doc) = self.document(uri) else {
            return Ok(Vec::new());
        };
        let Some(local) = doc.origin().range_to_local(range) else {
            return Ok(Vec::new());
        };
        let sheet = self.service.parse_stylesheet(&doc);
        let mut presentations = self.service.get_color_presentations(&doc, &sheet, color, local)?;
        for presentation in &mut presentations {
            let edits = presentation
                .text_edit
                .iter_mut()
                .chain(presentation.additional_text_edits.iter_mut().flatten());
            for edit in edits {
                edit.range = doc.origin().range_to_host(edit.range, TargetLine::Delta);
            }
        }
        Ok(presentations)
    }
}
