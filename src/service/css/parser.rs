//! Outline parser for stylesheets.
//!
//! Produces rules (selector + block) and declarations with byte spans, which
//! is all the query functions need. Nested blocks are accepted anywhere, so
//! at-rules and nested selectors share one shape. A trailing `prop: value`
//! without a terminator is kept as a declaration, which lets completion work
//! on half-typed input.

use std::ops::Range;

use tower_lsp::lsp_types::DiagnosticSeverity;

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub root: Block,
    pub issues: Vec<ParseIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub rules: Vec<Rule>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: String,
    pub selector_span: Range<usize>,
    /// From the selector start through the closing brace (or end of input).
    pub span: Range<usize>,
    /// Offset just after the opening brace.
    pub body_start: usize,
    pub body: Block,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub property: String,
    pub property_span: Range<usize>,
    pub value: String,
    pub value_span: Range<usize>,
    /// Ends at the terminator, so trailing whitespace after the colon is
    /// still inside.
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct ParseIssue {
    pub span: Range<usize>,
    pub message: String,
    pub severity: DiagnosticSeverity,
}

impl Rule {
    pub fn is_at_rule(&self) -> bool {
        self.selector.starts_with('@')
    }

    /// Whether an offset lies between the braces.
    pub fn body_contains(&self, offset: usize) -> bool {
        offset >= self.body_start
            && (offset < self.span.end || (!self.closed && offset == self.span.end))
    }
}

impl Declaration {
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.span.start && offset <= self.span.end
    }

    /// Whether an offset lies after the colon.
    pub fn in_value(&self, offset: usize) -> bool {
        self.contains(offset) && offset > self.property_span.end && offset >= self.value_span.start
    }
}

impl Block {
    /// Visit every rule depth-first, passing the enclosing rule's selector.
    pub fn walk<'a>(
        &'a self,
        parent: Option<&'a Rule>,
        visit: &mut impl FnMut(&'a Rule, Option<&'a Rule>),
    ) {
        for rule in &self.rules {
            visit(rule, parent);
            rule.body.walk(Some(rule), visit);
        }
    }

    pub fn all_declarations(&self) -> Vec<&Declaration> {
        let mut out: Vec<&Declaration> = self.declarations.iter().collect();
        self.walk(None, &mut |rule, _| out.extend(rule.body.declarations.iter()));
        out
    }

    /// Innermost block whose braces enclose the offset, and its rule.
    pub fn innermost_at(&self, offset: usize) -> (&Block, Option<&Rule>) {
        for rule in &self.rules {
            if rule.body_contains(offset) {
                let (block, inner) = rule.body.innermost_at(offset);
                return (block, inner.or(Some(rule)));
            }
        }
        (self, None)
    }
}

pub fn parse(text: &str) -> Stylesheet {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        issues: Vec::new(),
    };
    let (root, _) = parser.parse_block(true);
    Stylesheet {
        root,
        issues: parser.issues,
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    issues: Vec<ParseIssue>,
}

impl Parser<'_> {
    /// Parse items until the matching `}` (returns true) or end of input.
    fn parse_block(&mut self, top_level: bool) -> (Block, bool) {
        let mut block = Block::default();
        let mut item_start = self.pos;

        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'*') => {
                    let blank = self.text[item_start..self.pos].trim().is_empty();
                    self.skip_comment();
                    if blank {
                        item_start = self.pos;
                    }
                }
                quote @ (b'"' | b'\'') => self.skip_string(quote),
                b'{' => {
                    let selector_span = self.trim(item_start..self.pos);
                    self.pos += 1;
                    let body_start = self.pos;
                    let (body, closed) = self.parse_block(false);
                    if !closed {
                        self.issue(selector_span.clone(), "'}' expected", DiagnosticSeverity::ERROR);
                    }
                    block.rules.push(Rule {
                        selector: self.text[selector_span.clone()].to_string(),
                        span: selector_span.start..self.pos,
                        selector_span,
                        body_start,
                        body,
                        closed,
                    });
                    item_start = self.pos;
                }
                b';' => {
                    self.flush_declaration(&mut block, item_start..self.pos);
                    self.pos += 1;
                    item_start = self.pos;
                }
                b'}' => {
                    self.flush_declaration(&mut block, item_start..self.pos);
                    self.pos += 1;
                    if !top_level {
                        return (block, true);
                    }
                    self.issue(self.pos - 1..self.pos, "unexpected '}'", DiagnosticSeverity::ERROR);
                    item_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }

        self.flush_declaration(&mut block, item_start..self.pos);
        (block, false)
    }

    fn flush_declaration(&mut self, block: &mut Block, raw: Range<usize>) {
        let span = self.trim(raw.clone());
        if span.is_empty() {
            return;
        }

        let item = &self.text[span.clone()];
        let Some(colon) = item.find(':') else {
            if !item.starts_with('@') {
                self.issue(span, "colon expected", DiagnosticSeverity::ERROR);
            }
            return;
        };

        let property_span = self.trim(span.start..span.start + colon);
        if property_span.is_empty() {
            self.issue(span, "property name expected", DiagnosticSeverity::ERROR);
            return;
        }
        let value_span = self.trim(span.start + colon + 1..span.end);

        block.declarations.push(Declaration {
            property: self.text[property_span.clone()].to_string(),
            value: self.text[value_span.clone()].to_string(),
            property_span,
            // An empty value sits right after the colon.
            value_span: if value_span.is_empty() {
                span.start + colon + 1..span.start + colon + 1
            } else {
                value_span
            },
            span: span.start..raw.end,
        });
    }

    fn skip_comment(&mut self) {
        let start = self.pos;
        match self.text[self.pos + 2..].find("*/") {
            Some(end) => self.pos += 2 + end + 2,
            None => {
                self.pos = self.bytes.len();
                self.issue(start..self.pos, "comment not closed", DiagnosticSeverity::ERROR);
            }
        }
    }

    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => return,
                b if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    fn trim(&self, span: Range<usize>) -> Range<usize> {
        let slice = &self.text[span.clone()];
        let leading = slice.len() - slice.trim_start().len();
        let trailing = slice.len() - slice.trim_end().len();
        if leading == slice.len() {
            return span.start..span.start;
        }
        span.start + leading..span.end - trailing
    }

    fn issue(&mut self, span: Range<usize>, message: &str, severity: DiagnosticSeverity) {
        self.issues.push(ParseIssue {
            span,
            message: message.to_string(),
            severity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_and_declarations() {
        let sheet = parse(".a { color: red; margin: 0 }\n#b{padding:1px}");
        assert!(sheet.issues.is_empty());
        let rules = &sheet.root.rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector, ".a");
        let props: Vec<_> = rules[0]
            .body
            .declarations
            .iter()
            .map(|d| (d.property.as_str(), d.value.as_str()))
            .collect();
        assert_eq!(props, vec![("color", "red"), ("margin", "0")]);
        assert_eq!(rules[1].selector, "#b");
    }

    #[test]
    fn nested_at_rules() {
        let sheet = parse("@media screen { .a { color: red } }");
        let media = &sheet.root.rules[0];
        assert!(media.is_at_rule());
        assert_eq!(media.body.rules[0].selector, ".a");
        assert_eq!(sheet.root.all_declarations().len(), 1);
    }

    #[test]
    fn pseudo_class_selector_is_not_a_declaration() {
        let sheet = parse("a:hover { color: blue; }");
        assert_eq!(sheet.root.rules[0].selector, "a:hover");
        assert!(sheet.root.declarations.is_empty());
    }

    #[test]
    fn trailing_declaration_without_terminator() {
        let sheet = parse("color: re");
        let decl = &sheet.root.declarations[0];
        assert_eq!(decl.property, "color");
        assert_eq!(decl.value, "re");
        assert!(decl.in_value(9));
        assert!(!decl.in_value(3));
    }

    #[test]
    fn empty_value_keeps_cursor_inside() {
        let text = ".a { color: }";
        let sheet = parse(text);
        let decl = &sheet.root.rules[0].body.declarations[0];
        assert_eq!(decl.value, "");
        assert!(decl.in_value(text.find(": ").unwrap() + 2));
    }

    #[test]
    fn unclosed_rule_body_extends_to_end() {
        let text = ".a { col";
        let sheet = parse(text);
        assert!(sheet.root.rules[0].body_contains(text.len()));
    }

    #[test]
    fn reports_structural_errors() {
        let sheet = parse(".a { color: red;\n} }\n.b { margin");
        let messages: Vec<_> = sheet.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["unexpected '}'", "colon expected", "'}' expected"]);
    }

    #[test]
    fn comments_and_strings_are_opaque() {
        let sheet = parse("/* { */ .a { content: \"}\"; }");
        assert!(sheet.issues.is_empty());
        assert_eq!(sheet.root.rules[0].selector, ".a");
        assert_eq!(sheet.root.rules[0].body.declarations[0].value, "\"}\"");
    }

    #[test]
    fn unterminated_comment() {
        let sheet = parse(".a{} /* open");
        assert_eq!(sheet.issues[0].message, "comment not closed");
    }

    #[test]
    fn innermost_block_lookup() {
        let text = "@media print { .a { color: red } }";
        let sheet = parse(text);
        let offset = text.find("color").unwrap();
        let (block, rule) = sheet.root.innermost_at(offset);
        assert_eq!(rule.map(|r| r.selector.as_str()), Some(".a"));
        assert_eq!(block.declarations.len(), 1);
        assert!(sheet.root.innermost_at(0).1.is_none());
    }
}
