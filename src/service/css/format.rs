//! Stylesheet formatting.
//!
//! The region text is re-serialized in place: one statement per line, block
//! contents indented by nesting depth, whitespace runs collapsed to a single
//! space and `prop:value` spaced as `prop: value`. Comments, strings, escapes,
//! numbers and Sass syntax are emitted exactly as written. Input with
//! unbalanced braces or an unterminated comment or string is not formatted.

use crate::error::{Error, Result};

/// Indentation settings for formatted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleFormatOptions {
    pub tab_size: u32,
    pub insert_spaces: bool,
}

impl Default for StyleFormatOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
        }
    }
}

pub fn format_stylesheet(text: &str, options: &StyleFormatOptions) -> Result<String> {
    let unit = if options.insert_spaces {
        " ".repeat(options.tab_size as usize)
    } else {
        "\t".to_string()
    };
    Formatter {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        unit,
        depth: 0,
        parens: 0,
        item: String::new(),
        newlines: 0,
        block_started: false,
        out: String::with_capacity(text.len()),
    }
    .run()
}

fn malformed(message: &str) -> Error {
    Error::format("css", message)
}

/// `prop:value` with the colon spaced; at-rules and other statements as is.
fn statement(item: &str) -> String {
    let item = item.trim();
    if item.starts_with('@') {
        return item.to_string();
    }
    match item.split_once(':') {
        Some((property, value)) if !property.trim().is_empty() => {
            let value = value.trim();
            if value.is_empty() {
                format!("{}:", property.trim())
            } else {
                format!("{}: {}", property.trim(), value)
            }
        }
        _ => item.to_string(),
    }
}

struct Formatter<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    unit: String,
    depth: usize,
    /// Open parentheses in the current statement; braces and semicolons
    /// inside them are plain text (`url(data:...;base64,...)`).
    parens: usize,
    /// Statement text collected since the last terminator.
    item: String,
    /// Newlines between statements since the last emitted line.
    newlines: usize,
    /// Whether the current block has emitted a line yet.
    block_started: bool,
    out: String,
}

impl Formatter<'_> {
    fn run(mut self) -> Result<String> {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'*') => self.comment()?,
                b'"' | b'\'' => self.string(b)?,
                b'\\' => self.escape(),
                b'#' if self.bytes.get(self.pos + 1) == Some(&b'{') => self.interpolation()?,
                b if b.is_ascii_whitespace() => self.whitespace(),
                b'(' => {
                    self.parens += 1;
                    self.copy(1);
                }
                b')' => {
                    self.parens = self.parens.saturating_sub(1);
                    self.copy(1);
                }
                b'{' if self.parens == 0 => {
                    self.pos += 1;
                    let head = statement_head(&std::mem::take(&mut self.item));
                    self.line(&head);
                    self.depth += 1;
                    self.block_started = false;
                }
                b';' if self.parens == 0 => {
                    self.pos += 1;
                    if !self.item.trim().is_empty() {
                        let line = format!("{};", statement(&std::mem::take(&mut self.item)));
                        self.line(&line);
                    }
                }
                b'}' if self.parens == 0 => {
                    self.pos += 1;
                    if self.depth == 0 {
                        return Err(malformed("unexpected '}'"));
                    }
                    self.flush_last_statement();
                    self.depth -= 1;
                    self.newlines = 0;
                    self.line("}");
                }
                _ => {
                    let len = self.text[self.pos..].chars().next().map_or(1, char::len_utf8);
                    self.copy(len);
                }
            }
        }

        if self.depth > 0 {
            return Err(malformed("'}' expected"));
        }
        if !self.item.trim().is_empty() {
            let line = statement(&std::mem::take(&mut self.item));
            self.line(&line);
        }
        Ok(self.out)
    }

    /// The last declaration of a block gets its terminator.
    fn flush_last_statement(&mut self) {
        let item = std::mem::take(&mut self.item);
        if item.trim().is_empty() {
            return;
        }
        let mut line = statement(&item);
        if line.contains(':') && !line.starts_with('@') {
            line.push(';');
        }
        self.line(&line);
    }

    fn line(&mut self, content: &str) {
        if self.newlines >= 2 && self.block_started {
            self.out.push('\n');
        }
        for _ in 0..self.depth {
            self.out.push_str(&self.unit);
        }
        self.out.push_str(content);
        self.out.push('\n');
        self.newlines = 0;
        self.block_started = true;
        self.parens = 0;
    }

    fn copy(&mut self, len: usize) {
        let end = (self.pos + len).min(self.bytes.len());
        self.item.push_str(&self.text[self.pos..end]);
        self.pos = end;
    }

    fn whitespace(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if !b.is_ascii_whitespace() {
                break;
            }
            if b == b'\n' && self.item.is_empty() {
                self.newlines += 1;
            }
            self.pos += 1;
        }
        if !self.item.is_empty() && !self.item.ends_with(' ') {
            self.item.push(' ');
        }
    }

    fn comment(&mut self) -> Result<()> {
        let Some(end) = self.text[self.pos + 2..].find("*/") else {
            return Err(malformed("comment not closed"));
        };
        let len = 2 + end + 2;
        if self.item.trim().is_empty() {
            self.item.clear();
            let text = self.text;
            let comment = &text[self.pos..self.pos + len];
            self.pos += len;
            self.line(comment);
        } else {
            self.copy(len);
        }
        Ok(())
    }

    fn string(&mut self, quote: u8) -> Result<()> {
        let mut end = self.pos + 1;
        loop {
            match self.bytes.get(end) {
                None | Some(b'\n') => return Err(malformed("unterminated string")),
                Some(b'\\') => end += 2,
                Some(&b) if b == quote => break,
                Some(_) => end += 1,
            }
        }
        self.copy(end + 1 - self.pos);
        Ok(())
    }

    fn escape(&mut self) {
        let next = self.text[self.pos + 1..].chars().next().map_or(0, char::len_utf8);
        self.copy(1 + next);
    }

    fn interpolation(&mut self) -> Result<()> {
        let mut depth = 0;
        for (i, b) in self.bytes[self.pos + 1..].iter().enumerate() {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.copy(i + 2);
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(malformed("'}' expected"))
    }
}

fn statement_head(item: &str) -> String {
    let head = item.trim();
    if head.is_empty() {
        "{".to_string()
    } else {
        format!("{head} {{")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(text: &str) -> String {
        format_stylesheet(text, &StyleFormatOptions::default()).unwrap()
    }

    #[test]
    fn formats_compact_input() {
        assert_eq!(format(".a{color:red}"), ".a {\n    color: red;\n}\n");
    }

    #[test]
    fn indents_with_tabs() {
        let options = StyleFormatOptions {
            tab_size: 8,
            insert_spaces: false,
        };
        let formatted = format_stylesheet("@media print{.a{color:red}}", &options).unwrap();
        assert_eq!(formatted, "@media print {\n\t.a {\n\t\tcolor: red;\n\t}\n}\n");
    }

    #[test]
    fn empty_rules_are_kept() {
        assert_eq!(
            format(".empty {}\n.a { color: red }"),
            ".empty {\n}\n.a {\n    color: red;\n}\n"
        );
    }

    #[test]
    fn escapes_and_numbers_are_kept_verbatim() {
        assert_eq!(
            format(".a { content: \"\\201C\" }"),
            ".a {\n    content: \"\\201C\";\n}\n"
        );
        assert_eq!(
            format(".a { color: rgba(255, 0, 0, 0.50) }"),
            ".a {\n    color: rgba(255, 0, 0, 0.50);\n}\n"
        );
        assert_eq!(format(".a\\:b{top:0}"), ".a\\:b {\n    top: 0;\n}\n");
    }

    #[test]
    fn sass_syntax_is_kept() {
        assert_eq!(format("$x: 1;"), "$x: 1;\n");
        assert_eq!(
            format(".item-#{$i}{&:hover{color:$x}}"),
            ".item-#{$i} {\n    &:hover {\n        color: $x;\n    }\n}\n"
        );
        assert_eq!(format("@import 'theme';"), "@import 'theme';\n");
    }

    #[test]
    fn comments_are_kept() {
        assert_eq!(
            format("/* head */\n.a{ /* body */ color:red}"),
            "/* head */\n.a {\n    /* body */\n    color: red;\n}\n"
        );
    }

    #[test]
    fn semicolons_inside_parentheses_do_not_split() {
        assert_eq!(
            format(".a{background:url(data:image/png;base64,AA)}"),
            ".a {\n    background: url(data:image/png;base64,AA);\n}\n"
        );
    }

    #[test]
    fn single_blank_lines_between_statements_survive() {
        assert_eq!(format(".a{}\n\n\n.b{}"), ".a {\n}\n\n.b {\n}\n");
        assert_eq!(format(".a{\n\ntop:0}"), ".a {\n    top: 0;\n}\n");
    }

    #[test]
    fn malformed_input_is_an_error() {
        for text in [".a { color: red", ".a {} }", "/* open", ".a { content: \"x }"] {
            let err = format_stylesheet(text, &StyleFormatOptions::default()).unwrap_err();
            assert!(matches!(err, Error::Format { language: "css", .. }), "{text}");
        }
    }
}
