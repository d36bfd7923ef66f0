//! Script language backend.
//!
//! The script backend is a compiler-style service: it keeps state across
//! calls and sees the open documents as versioned source files supplied by a
//! [`ScriptHost`]. Offsets handed to and returned from the service are byte
//! offsets into the file's snapshot, i.e. region-local.

mod host;
mod lexical;

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use tower_lsp::lsp_types::{CompletionItemKind, SymbolKind, Url};

use crate::error::Result;
use crate::settings::CompilerOptions;

pub use host::{ScriptFile, ScriptProgramHost};
pub use lexical::LexicalScriptService;
pub(crate) use lexical::is_ident_byte;

/// Suffix that turns a document URI into a synthetic script file name.
pub const SCRIPT_FILE_SUFFIX: &str = ".ts";

/// Version reported for files that are not backed by an open document.
pub const LIBRARY_FILE_VERSION: &str = "0";

pub fn script_file_name(uri: &Url) -> String {
    format!("{uri}{SCRIPT_FILE_SUFFIX}")
}

/// Recover the document URI from a synthetic file name.
pub fn document_uri(file_name: &str) -> Option<Url> {
    Url::parse(file_name.strip_suffix(SCRIPT_FILE_SUFFIX)?).ok()
}

/// The file system view a script service runs against.
pub trait ScriptHost {
    fn compilation_settings(&self) -> &CompilerOptions;
    fn current_directory(&self) -> &Path;
    /// Managed files, in the order their documents were opened.
    fn script_file_names(&self) -> Vec<String>;
    fn script_version(&self, file_name: &str) -> String;
    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>>;
    fn file_exists(&self, file_name: &str) -> bool;
    /// Read a file outside the managed set from disk.
    fn read_file(&self, path: &Path) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptElementKind {
    Variable,
    Constant,
    Function,
    Method,
    Class,
    Import,
    Property,
    Keyword,
}

impl ScriptElementKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScriptElementKind::Variable => "var",
            ScriptElementKind::Constant => "const",
            ScriptElementKind::Function => "function",
            ScriptElementKind::Method => "method",
            ScriptElementKind::Class => "class",
            ScriptElementKind::Import => "alias",
            ScriptElementKind::Property => "property",
            ScriptElementKind::Keyword => "keyword",
        }
    }

    pub fn completion_kind(&self) -> CompletionItemKind {
        match self {
            ScriptElementKind::Variable => CompletionItemKind::VARIABLE,
            ScriptElementKind::Constant => CompletionItemKind::CONSTANT,
            ScriptElementKind::Function => CompletionItemKind::FUNCTION,
            ScriptElementKind::Method => CompletionItemKind::METHOD,
            ScriptElementKind::Class => CompletionItemKind::CLASS,
            ScriptElementKind::Import => CompletionItemKind::MODULE,
            ScriptElementKind::Property => CompletionItemKind::PROPERTY,
            ScriptElementKind::Keyword => CompletionItemKind::KEYWORD,
        }
    }

    pub fn symbol_kind(&self) -> SymbolKind {
        match self {
            ScriptElementKind::Variable => SymbolKind::VARIABLE,
            ScriptElementKind::Constant => SymbolKind::CONSTANT,
            ScriptElementKind::Function => SymbolKind::FUNCTION,
            ScriptElementKind::Method => SymbolKind::METHOD,
            ScriptElementKind::Class => SymbolKind::CLASS,
            ScriptElementKind::Import => SymbolKind::MODULE,
            ScriptElementKind::Property => SymbolKind::PROPERTY,
            ScriptElementKind::Keyword => SymbolKind::KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCompletion {
    pub name: String,
    pub kind: ScriptElementKind,
    /// File that declares the entry, when it is not the queried file.
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickInfo {
    pub kind: ScriptElementKind,
    pub name: String,
    /// Declaration source line, trimmed.
    pub declaration: String,
    /// Span of the identifier under the cursor.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDiagnostic {
    pub span: Range<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    pub name: String,
    pub kind: ScriptElementKind,
    pub span: Range<usize>,
}

/// Stateful, versioned-file language service for script regions.
pub trait ScriptService: Send {
    fn completions_at(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Vec<ScriptCompletion>>;

    fn quick_info_at(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Option<QuickInfo>>;

    fn diagnostics(&mut self, host: &dyn ScriptHost, file_name: &str)
        -> Result<Vec<ScriptDiagnostic>>;

    fn navigation_items(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
    ) -> Result<Vec<NavigationItem>>;

    fn highlights(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Vec<Range<usize>>>;
}
