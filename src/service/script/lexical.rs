//! Lexical script service.
//!
//! Each managed file is tokenized once per version into an index of
//! identifiers and declarations. Queries are answered from those indexes:
//! no type information, but enough for names, members and bracket checks.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use super::{
    NavigationItem, QuickInfo, ScriptCompletion, ScriptDiagnostic, ScriptElementKind, ScriptHost,
    ScriptService,
};
use crate::error::{Error, Result};

const LANGUAGE: &str = "javascript";

const KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "from", "function", "if",
    "import", "in", "instanceof", "let", "new", "null", "of", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "yield",
];

/// Keywords after which a `/` starts a regular expression.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "do", "else", "in", "of", "new", "delete", "void", "throw",
    "yield", "await",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

/// Identifier bytes; anything non-ASCII counts, so multi-byte names stay whole.
pub(crate) fn is_ident_byte(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Punct,
    Literal,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    kind: ScriptElementKind,
    span: Range<usize>,
}

#[derive(Debug)]
struct FileIndex {
    text: Arc<str>,
    tokens: Vec<Token>,
    declarations: Vec<Declaration>,
    diagnostics: Vec<ScriptDiagnostic>,
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    brackets: Vec<(u8, usize)>,
    diagnostics: Vec<ScriptDiagnostic>,
}

fn closing(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            brackets: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<ScriptDiagnostic>) {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let b = self.bytes[start];
            let next = self.bytes.get(start + 1).copied();
            match b {
                _ if b.is_ascii_whitespace() => self.pos += 1,
                b'/' if next == Some(b'/') => {
                    self.pos = self.text[start..]
                        .find('\n')
                        .map_or(self.bytes.len(), |n| start + n);
                }
                b'/' if next == Some(b'*') => match self.text[start + 2..].find("*/") {
                    Some(end) => self.pos = start + 2 + end + 2,
                    None => {
                        self.pos = self.bytes.len();
                        self.report(start..self.pos, "'*/' expected.");
                    }
                },
                b'/' if self.regex_allowed() => {
                    if self.scan_regex() {
                        self.push(TokenKind::Literal, start);
                    } else {
                        self.pos += 1;
                        self.push(TokenKind::Punct, start);
                    }
                }
                b'"' | b'\'' | b'`' => {
                    let terminated = self.scan_string(b);
                    if !terminated {
                        let message = if b == b'`' {
                            "Unterminated template literal."
                        } else {
                            "Unterminated string literal."
                        };
                        self.report(start..self.pos, message);
                    }
                    self.push(TokenKind::Literal, start);
                }
                _ if b.is_ascii_digit() => {
                    while self.pos < self.bytes.len()
                        && (is_ident_byte(self.bytes[self.pos]) || self.bytes[self.pos] == b'.')
                    {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Literal, start);
                }
                _ if is_ident_start(b) => {
                    while self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Ident, start);
                }
                b'(' | b'[' | b'{' => {
                    self.brackets.push((b, start));
                    self.pos += 1;
                    self.push(TokenKind::Punct, start);
                }
                b')' | b']' | b'}' => {
                    self.close_bracket(b, start);
                    self.pos += 1;
                    self.push(TokenKind::Punct, start);
                }
                _ => {
                    self.pos += 1;
                    self.push(TokenKind::Punct, start);
                }
            }
        }

        for (open, offset) in std::mem::take(&mut self.brackets).into_iter().rev() {
            let message = format!("'{}' expected.", closing(open) as char);
            self.report(offset..offset + 1, &message);
        }
        self.diagnostics.sort_by_key(|d| d.span.start);
        (self.tokens, self.diagnostics)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: start..self.pos,
        });
    }

    fn report(&mut self, span: Range<usize>, message: &str) {
        self.diagnostics.push(ScriptDiagnostic {
            span,
            message: message.to_string(),
        });
    }

    fn close_bracket(&mut self, close: u8, offset: usize) {
        let Some(depth) = self.brackets.iter().rposition(|(open, _)| closing(*open) == close) else {
            let message = format!("Unexpected '{}'.", close as char);
            self.report(offset..offset + 1, &message);
            return;
        };
        // Openers left between the match and the top were never closed.
        for (open, at) in self.brackets.split_off(depth + 1).into_iter().rev() {
            let message = format!("'{}' expected.", closing(open) as char);
            self.report(at..at + 1, &message);
        }
        self.brackets.pop();
    }

    /// Consume a quoted literal. Returns false when it runs off the line
    /// (or the input, for templates).
    fn scan_string(&mut self, quote: u8) -> bool {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' if quote != b'`' => return false,
                b if b == quote => {
                    self.pos += 1;
                    return true;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.bytes.len();
        false
    }

    fn regex_allowed(&self) -> bool {
        let Some(last) = self.tokens.last() else {
            return true;
        };
        let text = &self.text[last.span.clone()];
        match last.kind {
            TokenKind::Punct => !matches!(text, ")" | "]" | "}"),
            TokenKind::Ident => EXPRESSION_KEYWORDS.contains(&text),
            TokenKind::Literal => false,
        }
    }

    /// Consume a regex literal on the current line. Leaves the position
    /// untouched and returns false when there is no closing slash.
    fn scan_regex(&mut self) -> bool {
        let mut i = self.pos + 1;
        let mut in_class = false;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 1,
                b'\n' => return false,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    i += 1;
                    while i < self.bytes.len() && self.bytes[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    self.pos = i;
                    return true;
                }
                _ => {}
            }
            i += 1;
        }
        false
    }
}

/// Cursor over the token stream used to pick out declarations.
struct Declarations<'a> {
    text: &'a str,
    tokens: &'a [Token],
    out: Vec<Declaration>,
}

impl<'a> Declarations<'a> {
    fn word(&self, index: usize) -> Option<&'a str> {
        let token = self.tokens.get(index)?;
        (token.kind == TokenKind::Ident).then(|| &self.text[token.span.clone()])
    }

    fn is_punct(&self, index: usize, punct: &str) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|t| t.kind == TokenKind::Punct && &self.text[t.span.clone()] == punct)
    }

    fn declare(&mut self, index: usize, kind: ScriptElementKind) {
        let Some(name) = self.word(index).filter(|w| !is_keyword(w)) else {
            return;
        };
        self.out.push(Declaration {
            name: name.to_string(),
            kind,
            span: self.tokens[index].span.clone(),
        });
    }

    fn collect(mut self) -> Vec<Declaration> {
        for i in 0..self.tokens.len() {
            let Some(word) = self.word(i) else {
                continue;
            };
            if i > 0 && self.is_punct(i - 1, ".") {
                continue;
            }
            match word {
                "var" | "let" | "const" => {
                    let kind = if word == "const" {
                        ScriptElementKind::Constant
                    } else {
                        ScriptElementKind::Variable
                    };
                    self.bindings(i + 1, kind);
                }
                "function" => {
                    let name = if self.is_punct(i + 1, "*") { i + 2 } else { i + 1 };
                    self.declare(name, ScriptElementKind::Function);
                }
                "class" => self.declare(i + 1, ScriptElementKind::Class),
                "import" => self.imports(i + 1),
                _ if self.is_method_head(i) => self.declare(i, ScriptElementKind::Method),
                _ => {}
            }
        }
        self.out
    }

    /// Declarators of a `var`/`let`/`const` statement, including
    /// destructuring patterns and comma-separated lists.
    fn bindings(&mut self, start: usize, kind: ScriptElementKind) {
        let mut i = start;
        loop {
            i = if self.is_punct(i, "{") || self.is_punct(i, "[") {
                self.pattern(i, kind)
            } else {
                self.declare(i, kind);
                i + 1
            };

            // Skip the initializer up to the next top-level comma.
            let mut depth = 0i32;
            loop {
                let Some(token) = self.tokens.get(i) else {
                    return;
                };
                let text = &self.text[token.span.clone()];
                match (token.kind, text) {
                    (TokenKind::Punct, "(" | "[" | "{") => depth += 1,
                    (TokenKind::Punct, ")" | "]" | "}") => {
                        depth -= 1;
                        if depth < 0 {
                            return;
                        }
                    }
                    (TokenKind::Punct, ";") if depth == 0 => return,
                    (TokenKind::Punct, ",") if depth == 0 => break,
                    (TokenKind::Ident, "var" | "let" | "const" | "function" | "class" | "return")
                        if depth == 0 =>
                    {
                        return
                    }
                    _ => {}
                }
                i += 1;
            }
            i += 1;
        }
    }

    /// Names bound by a destructuring pattern. Returns the index after it.
    fn pattern(&mut self, open: usize, kind: ScriptElementKind) -> usize {
        let mut depth = 0;
        let mut i = open;
        while let Some(token) = self.tokens.get(i) {
            let text = &self.text[token.span.clone()];
            match token.kind {
                TokenKind::Punct if matches!(text, "{" | "[") => depth += 1,
                TokenKind::Punct if matches!(text, "}" | "]") => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                TokenKind::Ident => {
                    let binds = [",", "}", "]", "="].iter().any(|p| self.is_punct(i + 1, p));
                    let renamed_from = self.is_punct(i + 1, ":");
                    let default_value = i > 0 && self.is_punct(i - 1, "=");
                    if binds && !renamed_from && !default_value {
                        self.declare(i, kind);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        i
    }

    fn imports(&mut self, start: usize) {
        let mut i = start;
        while let Some(token) = self.tokens.get(i) {
            if token.kind == TokenKind::Literal || self.is_punct(i, ";") {
                return;
            }
            match self.word(i) {
                Some("from") => return,
                Some("as") | Some("type") => {}
                Some(_) if self.word(i + 1) == Some("as") => {}
                Some(_) => self.declare(i, ScriptElementKind::Import),
                None => {}
            }
            i += 1;
        }
    }

    /// `name(...) {` at the start of a class or object member.
    fn is_method_head(&self, i: usize) -> bool {
        if !self.is_punct(i + 1, "(") {
            return false;
        }
        let member_start = i == 0
            || ["{", "}", ";", ","].iter().any(|p| self.is_punct(i - 1, p))
            || matches!(self.word(i - 1), Some("async" | "static" | "get" | "set"));
        if !member_start {
            return false;
        }

        let mut depth = 0;
        for j in i + 1..self.tokens.len() {
            if self.is_punct(j, "(") {
                depth += 1;
            } else if self.is_punct(j, ")") {
                depth -= 1;
                if depth == 0 {
                    return self.is_punct(j + 1, "{");
                }
            }
        }
        false
    }
}

impl FileIndex {
    fn build(text: Arc<str>) -> Self {
        let (tokens, diagnostics) = Lexer::new(&text).run();
        let declarations = Declarations {
            text: &text,
            tokens: &tokens,
            out: Vec::new(),
        }
        .collect();
        Self {
            text,
            tokens,
            declarations,
            diagnostics,
        }
    }

    fn token_text(&self, token: &Token) -> &str {
        &self.text[token.span.clone()]
    }

    /// Identifier token touching the offset.
    fn ident_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.iter().find(|t| {
            t.kind == TokenKind::Ident && t.span.start <= offset && offset <= t.span.end
        })
    }

    fn in_literal(&self, offset: usize) -> bool {
        self.tokens
            .iter()
            .any(|t| t.kind == TokenKind::Literal && t.span.start < offset && offset < t.span.end)
    }

    fn is_member(&self, index: usize) -> bool {
        index > 0 && {
            let prev = &self.tokens[index - 1];
            prev.kind == TokenKind::Punct && self.token_text(prev) == "."
        }
    }

    fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    fn line_of(&self, span: &Range<usize>) -> String {
        let start = self.text[..span.start].rfind('\n').map_or(0, |n| n + 1);
        let end = self.text[span.end..]
            .find('\n')
            .map_or(self.text.len(), |n| span.end + n);
        self.text[start..end].trim().to_string()
    }
}

struct CachedIndex {
    version: String,
    index: Arc<FileIndex>,
}

/// Built-in script service backed by per-file token indexes.
#[derive(Default)]
pub struct LexicalScriptService {
    files: HashMap<String, CachedIndex>,
}

impl LexicalScriptService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget files the host no longer lists.
    fn sync(&mut self, host: &dyn ScriptHost) {
        let live: HashSet<String> = host.script_file_names().into_iter().collect();
        self.files.retain(|name, _| live.contains(name));
    }

    fn index(&mut self, host: &dyn ScriptHost, file_name: &str) -> Option<Arc<FileIndex>> {
        if !host.compilation_settings().allow_js || !host.file_exists(file_name) {
            return None;
        }

        let version = host.script_version(file_name);
        if let Some(cached) = self.files.get(file_name) {
            if cached.version == version {
                return Some(Arc::clone(&cached.index));
            }
        }

        let text = host.script_snapshot(file_name)?;
        let index = Arc::new(FileIndex::build(text));
        tracing::trace!(file = file_name, %version, "indexed script file");
        self.files.insert(
            file_name.to_string(),
            CachedIndex {
                version,
                index: Arc::clone(&index),
            },
        );
        Some(index)
    }

    fn query(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Option<Arc<FileIndex>>> {
        self.sync(host);
        let Some(index) = self.index(host, file_name) else {
            return Ok(None);
        };
        if offset > index.text.len() {
            return Err(Error::backend(
                LANGUAGE,
                format!("offset {offset} is outside {file_name}"),
            ));
        }
        Ok(Some(index))
    }
}

impl ScriptService for LexicalScriptService {
    fn completions_at(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Vec<ScriptCompletion>> {
        let Some(index) = self.query(host, file_name, offset)? else {
            return Ok(Vec::new());
        };
        if index.in_literal(offset) {
            return Ok(Vec::new());
        }

        let before = &index.text[..offset];
        let prefix_start = offset - before.bytes().rev().take_while(|b| is_ident_byte(*b)).count();
        let member_access = index.text[..prefix_start].trim_end().ends_with('.');

        if member_access {
            let members: BTreeSet<&str> = index
                .tokens
                .iter()
                .enumerate()
                .filter(|(i, t)| {
                    t.kind == TokenKind::Ident && t.span.start != prefix_start && index.is_member(*i)
                })
                .map(|(_, t)| index.token_text(t))
                .collect();
            return Ok(members
                .into_iter()
                .map(|name| ScriptCompletion {
                    name: name.to_string(),
                    kind: ScriptElementKind::Property,
                    source: None,
                })
                .collect());
        }

        let mut seen = HashSet::new();
        let mut completions = Vec::new();
        for decl in &index.declarations {
            if decl.span.start != prefix_start && seen.insert(decl.name.clone()) {
                completions.push(ScriptCompletion {
                    name: decl.name.clone(),
                    kind: decl.kind,
                    source: None,
                });
            }
        }

        for other in host.script_file_names() {
            if other == file_name {
                continue;
            }
            let Some(other_index) = self.index(host, &other) else {
                continue;
            };
            for decl in &other_index.declarations {
                if seen.insert(decl.name.clone()) {
                    completions.push(ScriptCompletion {
                        name: decl.name.clone(),
                        kind: decl.kind,
                        source: Some(other.clone()),
                    });
                }
            }
        }

        completions.extend(
            KEYWORDS
                .iter()
                .filter(|k| seen.insert(k.to_string()))
                .map(|k| ScriptCompletion {
                    name: k.to_string(),
                    kind: ScriptElementKind::Keyword,
                    source: None,
                }),
        );
        Ok(completions)
    }

    fn quick_info_at(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Option<QuickInfo>> {
        let Some(index) = self.query(host, file_name, offset)? else {
            return Ok(None);
        };
        let Some(token) = index.ident_at(offset) else {
            return Ok(None);
        };
        let name = index.token_text(token);
        if is_keyword(name) {
            return Ok(None);
        }

        let info = |owner: &FileIndex, decl: &Declaration| QuickInfo {
            kind: decl.kind,
            name: name.to_string(),
            declaration: owner.line_of(&decl.span),
            span: token.span.clone(),
        };

        if let Some(decl) = index.declaration(name) {
            return Ok(Some(info(&index, decl)));
        }
        for other in host.script_file_names() {
            if other == file_name {
                continue;
            }
            if let Some(other_index) = self.index(host, &other) {
                if let Some(decl) = other_index.declaration(name) {
                    return Ok(Some(info(&other_index, decl)));
                }
            }
        }
        Ok(None)
    }

    fn diagnostics(&mut self, host: &dyn ScriptHost, file_name: &str) -> Result<Vec<ScriptDiagnostic>> {
        Ok(self
            .query(host, file_name, 0)?
            .map(|index| index.diagnostics.clone())
            .unwrap_or_default())
    }

    fn navigation_items(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
    ) -> Result<Vec<NavigationItem>> {
        let Some(index) = self.query(host, file_name, 0)? else {
            return Ok(Vec::new());
        };
        Ok(index
            .declarations
            .iter()
            .map(|decl| NavigationItem {
                name: decl.name.clone(),
                kind: decl.kind,
                span: decl.span.clone(),
            })
            .collect())
    }

    fn highlights(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        offset: usize,
    ) -> Result<Vec<Range<usize>>> {
        let Some(index) = self.query(host, file_name, offset)? else {
            return Ok(Vec::new());
        };
        let Some(target) = index.ident_at(offset) else {
            return Ok(Vec::new());
        };
        let name = index.token_text(target);
        Ok(index
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Ident && index.token_text(t) == name)
            .map(|t| t.span.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CompilerOptions;
    use indexmap::IndexMap;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct TestHost {
        options: CompilerOptions,
        files: IndexMap<String, (u32, Arc<str>)>,
        root: PathBuf,
    }

    impl TestHost {
        fn with(files: &[(&str, &str)]) -> Self {
            let mut host = TestHost::default();
            for (name, text) in files {
                host.set(name, text);
            }
            host
        }

        fn set(&mut self, name: &str, text: &str) {
            let version = self.files.get(name).map_or(1, |(v, _)| v + 1);
            self.files.insert(name.to_string(), (version, Arc::from(text)));
        }
    }

    impl ScriptHost for TestHost {
        fn compilation_settings(&self) -> &CompilerOptions {
            &self.options
        }
        fn current_directory(&self) -> &Path {
            &self.root
        }
        fn script_file_names(&self) -> Vec<String> {
            self.files.keys().cloned().collect()
        }
        fn script_version(&self, file_name: &str) -> String {
            self.files
                .get(file_name)
                .map_or("0".to_string(), |(v, _)| v.to_string())
        }
        fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>> {
            self.files.get(file_name).map(|(_, text)| Arc::clone(text))
        }
        fn file_exists(&self, file_name: &str) -> bool {
            self.files.contains_key(file_name)
        }
        fn read_file(&self, _path: &Path) -> Option<String> {
            None
        }
    }

    fn names(completions: &[ScriptCompletion]) -> Vec<&str> {
        completions.iter().map(|c| c.name.as_str()).collect()
    }

    fn decl_names(text: &str) -> Vec<(String, ScriptElementKind)> {
        FileIndex::build(Arc::from(text))
            .declarations
            .into_iter()
            .map(|d| (d.name, d.kind))
            .collect()
    }

    #[test]
    fn collects_declarations() {
        use ScriptElementKind::*;
        let text = "import Foo, { a, b as c } from './x';\n\
                    const { d, e: f, g = 1 } = obj, h = [1, 2];\n\
                    let i;\n\
                    function* gen() {}\n\
                    export default class App {\n  onClick(e) { this.count++; }\n}";
        assert_eq!(
            decl_names(text),
            vec![
                ("Foo".into(), Import),
                ("a".into(), Import),
                ("c".into(), Import),
                ("d".into(), Constant),
                ("f".into(), Constant),
                ("g".into(), Constant),
                ("h".into(), Constant),
                ("i".into(), Variable),
                ("gen".into(), Function),
                ("App".into(), Class),
                ("onClick".into(), Method),
            ]
        );
    }

    #[test]
    fn control_flow_is_not_a_method() {
        let names = decl_names("function f() { if (x) { return 1; } while (y) {} }");
        assert_eq!(names, vec![("f".to_string(), ScriptElementKind::Function)]);
    }

    #[test]
    fn reports_unbalanced_brackets() {
        let (_, diagnostics) = Lexer::new("function f() {\n  call(1;\n").run();
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["'}' expected.", "')' expected."]);

        let (_, diagnostics) = Lexer::new("a());").run();
        assert_eq!(diagnostics[0].message, "Unexpected ')'.");
        assert_eq!(diagnostics[0].span, 3..4);
    }

    #[test]
    fn reports_unterminated_literals() {
        let (_, diagnostics) = Lexer::new("let a = 'open\nlet b = `tpl").run();
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Unterminated string literal.", "Unterminated template literal."]
        );
        let (_, diagnostics) = Lexer::new("/* never closed").run();
        assert_eq!(diagnostics[0].message, "'*/' expected.");
    }

    #[test]
    fn brackets_in_strings_and_regexes_are_ignored() {
        let (_, diagnostics) = Lexer::new("let s = '(';\nlet r = /[)']+/g;\nlet q = a / b;").run();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn member_completions_after_dot() {
        let host = TestHost::with(&[("a.ts", "this.count = 1;\nthis.name = 'x';\nthis.")]);
        let mut service = LexicalScriptService::new();
        let offset = host.files["a.ts"].1.len();
        let completions = service.completions_at(&host, "a.ts", offset).unwrap();
        assert_eq!(names(&completions), vec!["count", "name"]);
    }

    #[test]
    fn member_completions_skip_partial_word() {
        let host = TestHost::with(&[("a.ts", "obj.total;\nobj.to")]);
        let mut service = LexicalScriptService::new();
        let offset = host.files["a.ts"].1.len();
        let completions = service.completions_at(&host, "a.ts", offset).unwrap();
        assert_eq!(names(&completions), vec!["total"]);
    }

    #[test]
    fn identifier_completions_span_files() {
        let host = TestHost::with(&[
            ("a.ts", "const local = 1;\n"),
            ("b.ts", "function shared() {}\n"),
        ]);
        let mut service = LexicalScriptService::new();
        let completions = service.completions_at(&host, "a.ts", 17).unwrap();
        assert_eq!(&names(&completions)[..2], &["local", "shared"]);
        assert_eq!(completions[1].source.as_deref(), Some("b.ts"));
        assert!(names(&completions).contains(&"return"));
    }

    #[test]
    fn no_completions_inside_strings() {
        let host = TestHost::with(&[("a.ts", "let s = 'abc';")]);
        let mut service = LexicalScriptService::new();
        assert!(service.completions_at(&host, "a.ts", 10).unwrap().is_empty());
    }

    #[test]
    fn quick_info_shows_declaration_line() {
        let host = TestHost::with(&[("a.ts", "  let total = 0;\ntotal += 1;")]);
        let mut service = LexicalScriptService::new();
        let info = service.quick_info_at(&host, "a.ts", 18).unwrap().unwrap();
        assert_eq!(info.name, "total");
        assert_eq!(info.kind, ScriptElementKind::Variable);
        assert_eq!(info.declaration, "let total = 0;");
        assert_eq!(info.span, 17..22);
        assert!(service.quick_info_at(&host, "a.ts", 3).unwrap().is_none());
    }

    #[test]
    fn highlights_every_occurrence() {
        let host = TestHost::with(&[("a.ts", "let n = 1;\nn = n + 1;")]);
        let mut service = LexicalScriptService::new();
        let spans = service.highlights(&host, "a.ts", 4).unwrap();
        assert_eq!(spans, vec![4..5, 11..12, 15..16]);
    }

    #[test]
    fn offset_past_end_is_an_error() {
        let host = TestHost::with(&[("a.ts", "x")]);
        let mut service = LexicalScriptService::new();
        let err = service.completions_at(&host, "a.ts", 10).unwrap_err();
        assert!(matches!(err, Error::Backend { language: "javascript", .. }));
    }

    #[test]
    fn disallowed_scripts_are_not_in_the_program() {
        let mut host = TestHost::with(&[("a.ts", "let x = (;")]);
        host.options.allow_js = false;
        let mut service = LexicalScriptService::new();
        assert!(service.diagnostics(&host, "a.ts").unwrap().is_empty());
        assert!(service.navigation_items(&host, "a.ts").unwrap().is_empty());
        assert!(service.completions_at(&host, "a.ts", 0).unwrap().is_empty());
    }

    #[test]
    fn index_is_rebuilt_only_on_version_change() {
        let mut host = TestHost::with(&[("a.ts", "let a;"), ("b.ts", "let b;")]);
        let mut service = LexicalScriptService::new();

        let first = service.index(&host, "a.ts").unwrap();
        let again = service.index(&host, "a.ts").unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        host.set("a.ts", "let renamed;");
        let rebuilt = service.index(&host, "a.ts").unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.declarations[0].name, "renamed");

        service.index(&host, "b.ts").unwrap();
        host.files.shift_remove("b.ts");
        service.diagnostics(&host, "a.ts").unwrap();
        assert!(!service.files.contains_key("b.ts"));
    }
}
