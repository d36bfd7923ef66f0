//! Stylesheet language backend.
//!
//! The service is stateless: every query re-parses the virtual document it is
//! given. All positions and ranges are in the virtual document's own
//! coordinate space; translation to host space is the adapter's job.

mod color;
mod data;
mod format;
mod parser;

use std::ops::Range;

use tower_lsp::lsp_types::{
    Color, ColorInformation, ColorPresentation, CompletionItem, CompletionItemKind,
    CompletionList, CompletionTextEdit, Diagnostic, DocumentHighlight, DocumentHighlightKind,
    Documentation, Hover, HoverContents, Location, MarkupContent, MarkupKind, NumberOrString,
    Position, SymbolInformation, SymbolKind, TextEdit,
};

use crate::document::VirtualDocument;
use crate::error::Result;

pub use format::StyleFormatOptions;
pub use parser::{Block, Declaration, ParseIssue, Rule, Stylesheet};

const SOURCE: &str = "css";

/// Parse-and-query contract for the style language.
pub trait StylesheetService: Send + Sync {
    fn parse_stylesheet(&self, doc: &VirtualDocument) -> Stylesheet;

    fn do_complete(
        &self,
        doc: &VirtualDocument,
        position: Position,
        sheet: &Stylesheet,
    ) -> Result<CompletionList>;

    fn do_hover(
        &self,
        doc: &VirtualDocument,
        position: Position,
        sheet: &Stylesheet,
    ) -> Result<Option<Hover>>;

    fn do_validation(&self, doc: &VirtualDocument, sheet: &Stylesheet) -> Result<Vec<Diagnostic>>;

    fn find_document_symbols(
        &self,
        doc: &VirtualDocument,
        sheet: &Stylesheet,
    ) -> Result<Vec<SymbolInformation>>;

    fn find_document_highlights(
        &self,
        doc: &VirtualDocument,
        position: Position,
        sheet: &Stylesheet,
    ) -> Result<Vec<DocumentHighlight>>;

    fn find_document_colors(
        &self,
        doc: &VirtualDocument,
        sheet: &Stylesheet,
    ) -> Result<Vec<ColorInformation>>;

    fn get_color_presentations(
        &self,
        doc: &VirtualDocument,
        sheet: &Stylesheet,
        color: Color,
        range: tower_lsp::lsp_types::Range,
    ) -> Result<Vec<ColorPresentation>>;

    /// Re-serialize the whole document.
    fn format(&self, doc: &VirtualDocument, options: &StyleFormatOptions) -> Result<String>;
}

/// Built-in stylesheet backend.
#[derive(Debug, Default, Clone)]
pub struct CssService;

impl CssService {
    pub fn new() -> Self {
        Self
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Span of the word touching `offset`, in either direction.
fn word_at(text: &str, offset: usize) -> Range<usize> {
    let bytes = text.as_bytes();
    let offset = offset.min(bytes.len());
    let start = offset - bytes[..offset].iter().rev().take_while(|b| is_word_byte(**b)).count();
    let end = offset + bytes[offset..].iter().take_while(|b| is_word_byte(**b)).count();
    start..end
}

fn markdown(value: String) -> HoverContents {
    HoverContents::Markup(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}

fn completion_item(
    label: &str,
    kind: CompletionItemKind,
    new_text: String,
    range: tower_lsp::lsp_types::Range,
    documentation: Option<String>,
) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        documentation: documentation.map(Documentation::String),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit { range, new_text })),
        ..Default::default()
    }
}

fn property_completions(range: tower_lsp::lsp_types::Range) -> Vec<CompletionItem> {
    let mut defs: Vec<_> = data::PROPERTIES.values().collect();
    defs.sort_by_key(|d| d.name);
    defs.into_iter()
        .map(|def| {
            completion_item(
                def.name,
                CompletionItemKind::PROPERTY,
                format!("{}: ", def.name),
                range,
                Some(def.description.to_string()),
            )
        })
        .collect()
}

fn value_completions(property: &str, range: tower_lsp::lsp_types::Range) -> Vec<CompletionItem> {
    let def = data::get_property(property);
    let mut items: Vec<CompletionItem> = def
        .map(|d| d.values)
        .unwrap_or_default()
        .iter()
        .chain(data::global_values())
        .map(|v| completion_item(v, CompletionItemKind::VALUE, v.to_string(), range, None))
        .collect();

    let takes_color = def.map_or(property.starts_with("--"), |d| d.accepts_color);
    if takes_color {
        items.extend(color::color_names().map(|name| {
            let hex = color::named_color(name).map(|c| color::presentations(&c).swap_remove(1));
            completion_item(name, CompletionItemKind::COLOR, name.to_string(), range, hex)
        }));
    }
    items
}

fn selector_completions(range: tower_lsp::lsp_types::Range) -> Vec<CompletionItem> {
    data::HTML_ELEMENTS
        .iter()
        .map(|tag| completion_item(tag, CompletionItemKind::KEYWORD, tag.to_string(), range, None))
        .collect()
}

/// (ids, classes/attributes/pseudo-classes, elements)
fn specificity(selector: &str) -> (u32, u32, u32) {
    let mut counts = (0, 0, 0);
    let bytes = selector.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => counts.0 += 1,
            b'.' | b'[' => counts.1 += 1,
            b':' if bytes.get(i + 1) == Some(&b':') => {
                counts.2 += 1;
                i += 1;
            }
            b':' => counts.1 += 1,
            b if b.is_ascii_alphabetic() => {
                let starts_compound =
                    i == 0 || matches!(bytes[i - 1], b' ' | b'>' | b'+' | b'~' | b',');
                if starts_compound {
                    counts.2 += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    counts
}

impl StylesheetService for CssService {
    fn parse_stylesheet(&self, doc: &VirtualDocument) -> Stylesheet {
        parser::parse(doc.text())
    }

    fn do_complete(
        &self,
        doc: &VirtualDocument,
        position: Position,
        sheet: &Stylesheet,
    ) -> Result<CompletionList> {
        let Some(offset) = doc.line_index.position_to_offset(position) else {
            return Ok(CompletionList::default());
        };
        let range = doc.line_index.span_to_range(&word_at(doc.text(), offset));

        let (block, rule) = sheet.root.innermost_at(offset);
        let declaration = block.declarations.iter().find(|d| d.contains(offset));

        let items = match (declaration, rule) {
            (Some(decl), _) if decl.in_value(offset) => value_completions(&decl.property, range),
            (Some(_), _) | (None, Some(_)) => property_completions(range),
            (None, None) => selector_completions(range),
        };

        Ok(CompletionList {
            is_incomplete: false,
            items,
        })
    }

    fn do_hover(
        &self,
        doc: &VirtualDocument,
        position: Position,
        sheet: &Stylesheet,
    ) -> Result<Option<Hover>> {
        let Some(offset) = doc.line_index.position_to_offset(position) else {
            return Ok(None);
        };
        let touches = |span: &Range<usize>| offset >= span.start && offset <= span.end;

        let declaration = sheet
            .root
            .all_declarations()
            .into_iter()
            .find(|d| touches(&d.property_span));
        if let Some(decl) = declaration {
            let Some(def) = data::get_property(&decl.property) else {
                return Ok(None);
            };
            return Ok(Some(Hover {
                contents: markdown(format!("**{}**\n\n{}", def.name, def.description)),
                range: Some(doc.line_index.span_to_range(&decl.property_span)),
            }));
        }

        let mut hovered = None;
        sheet.root.walk(None, &mut |rule, _| {
            if hovered.is_none() && !rule.is_at_rule() && touches(&rule.selector_span) {
                hovered = Some(rule);
            }
        });
        Ok(hovered.map(|rule| {
            let (a, b, c) = specificity(&rule.selector);
            Hover {
                contents: markdown(format!(
                    "`{}`\n\nSelector specificity: ({a}, {b}, {c})",
                    rule.selector
                )),
                range: Some(doc.line_index.span_to_range(&rule.selector_span)),
            }
        }))
    }

    fn do_validation(&self, doc: &VirtualDocument, sheet: &Stylesheet) -> Result<Vec<Diagnostic>> {
        let diagnostic = |span: &Range<usize>, severity, code: Option<&str>, message: String| {
            Diagnostic {
                range: doc.line_index.span_to_range(span),
                severity: Some(severity),
                code: code.map(|c| NumberOrString::String(c.to_string())),
                source: Some(SOURCE.to_string()),
                message,
                ..Default::default()
            }
        };

        let mut diagnostics: Vec<Diagnostic> = sheet
            .issues
            .iter()
            .map(|issue| diagnostic(&issue.span, issue.severity, None, issue.message.clone()))
            .collect();

        for decl in sheet.root.all_declarations() {
            if !data::is_known_property(&decl.property) {
                diagnostics.push(diagnostic(
                    &decl.property_span,
                    tower_lsp::lsp_types::DiagnosticSeverity::WARNING,
                    Some("unknownProperties"),
                    format!("Unknown property: '{}'", decl.property),
                ));
            }
        }

        sheet.root.walk(None, &mut |rule, _| {
            let body = &rule.body;
            if rule.closed && body.rules.is_empty() && body.declarations.is_empty() {
                diagnostics.push(diagnostic(
                    &rule.selector_span,
                    tower_lsp::lsp_types::DiagnosticSeverity::WARNING,
                    Some("emptyRules"),
                    "Do not use empty rulesets".to_string(),
                ));
            }
        });

        Ok(diagnostics)
    }

    #[allow(deprecated)]
    fn find_document_symbols(
        &self,
        doc: &VirtualDocument,
        sheet: &Stylesheet,
    ) -> Result<Vec<SymbolInformation>> {
        let mut symbols = Vec::new();
        sheet.root.walk(None, &mut |rule, parent| {
            symbols.push(SymbolInformation {
                name: rule.selector.clone(),
                kind: if rule.is_at_rule() {
                    SymbolKind::MODULE
                } else {
                    SymbolKind::CLASS
                },
                tags: None,
                deprecated: None,
                location: Location {
                    uri: doc.uri.clone(),
                    range: doc.line_index.span_to_range(&rule.span),
                },
                container_name: parent.map(|p| p.selector.clone()),
            });
        });
        Ok(symbols)
    }

    fn find_document_highlights(
        &self,
        doc: &VirtualDocument,
        position: Position,
        _sheet: &Stylesheet,
    ) -> Result<Vec<DocumentHighlight>> {
        let Some(offset) = doc.line_index.position_to_offset(position) else {
            return Ok(Vec::new());
        };
        let text = doc.text();
        let word = word_at(text, offset);
        if word.is_empty() {
            return Ok(Vec::new());
        }
        let needle = &text[word];

        let bytes = text.as_bytes();
        let highlights = text
            .match_indices(needle)
            .map(|(start, _)| start..start + needle.len())
            .filter(|span| {
                let before = span.start.checked_sub(1).map(|i| bytes[i]);
                let after = bytes.get(span.end).copied();
                !before.is_some_and(is_word_byte) && !after.is_some_and(is_word_byte)
            })
            .map(|span| DocumentHighlight {
                range: doc.line_index.span_to_range(&span),
                kind: Some(DocumentHighlightKind::READ),
            })
            .collect();
        Ok(highlights)
    }

    fn find_document_colors(
        &self,
        doc: &VirtualDocument,
        sheet: &Stylesheet,
    ) -> Result<Vec<ColorInformation>> {
        let mut colors = Vec::new();
        for decl in sheet.root.all_declarations() {
            let include_named = data::get_property(&decl.property)
                .map_or(decl.property.starts_with("--"), |d| d.accepts_color);
            for (span, color) in color::find_colors(&decl.value, include_named) {
                let start = decl.value_span.start + span.start;
                let end = decl.value_span.start + span.end;
                colors.push(ColorInformation {
                    range: doc.line_index.span_to_range(&(start..end)),
                    color,
                });
            }
        }
        Ok(colors)
    }

    fn get_color_presentations(
        &self,
        _doc: &VirtualDocument,
        _sheet: &Stylesheet,
        color: Color,
        range: tower_lsp::lsp_types::Range,
    ) -> Result<Vec<ColorPresentation>> {
        Ok(color::presentations(&color)
            .into_iter()
            .map(|label| ColorPresentation {
                text_edit: Some(TextEdit {
                    range,
                    new_text: label.clone(),
                }),
                label,
                additional_text_edits: None,
            })
            .collect())
    }

    fn format(&self, doc: &VirtualDocument, options: &StyleFormatOptions) -> Result<String> {
        format::format_stylesheet(doc.text(), options)
    }
}
