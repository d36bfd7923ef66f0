//! Region extraction for Mahal component files.
//!
//! A component file is markup with top-level `<script>` and `<style>` blocks.
//! Extraction scans the host text once, skipping HTML comments, and yields
//! the content span of each block. Malformed blocks are dropped without
//! affecting the rest of the file.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::text::LineIndex;
use super::translate::RegionOrigin;

/// Embedded languages that have an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageId {
    Style,
    Script,
}

impl LanguageId {
    pub const ALL: [LanguageId; 2] = [LanguageId::Style, LanguageId::Script];

    /// Language identifier as the editor knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::Style => "css",
            LanguageId::Script => "javascript",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "style" => Some(LanguageId::Style),
            "script" => Some(LanguageId::Script),
            _ => None,
        }
    }

    fn closing_tag(&self) -> &'static Regex {
        match self {
            LanguageId::Style => &STYLE_CLOSE,
            LanguageId::Script => &SCRIPT_CLOSE,
        }
    }
}

/// A contiguous span of host text attributed to one embedded language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub language: LanguageId,
    /// Content span in host bytes, excluding both tags.
    pub span: Range<usize>,
    /// Host position of the first content byte.
    pub origin: RegionOrigin,
}

impl Region {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn start_line(&self) -> u32 {
        self.origin.line
    }

    /// The end bound is inclusive so a cursor sitting right before the
    /// closing tag still belongs to the region.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.span.start && offset <= self.span.end
    }
}

/// Either an HTML comment opener or a region opening tag. The tag name must
/// end at whitespace, `/` or `>`, and quoted attribute values may hold `>`.
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<!--|<(script|style)((?:[\s/](?:"[^"]*"|'[^']*'|[^'">])*)?)>"#).unwrap()
});

static SCRIPT_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</script\s*>").unwrap());

static STYLE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</style\s*>").unwrap());

/// Extract the ordered, non-overlapping regions of a host document.
///
/// Only the first region of each language is kept.
pub fn extract_regions(line_index: &LineIndex) -> Vec<Region> {
    let text = line_index.text();
    let mut regions: Vec<Region> = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = OPEN_TAG.captures(&text[cursor..]) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let tag_start = cursor + whole.start();
        let tag_end = cursor + whole.end();

        let Some(tag) = caps.get(1) else {
            // Comment: resume after its terminator, or stop if it never ends.
            match text[tag_end..].find("-->") {
                Some(close) => {
                    cursor = tag_end + close + 3;
                    continue;
                }
                None => break,
            }
        };

        let attributes = caps.get(2).map_or("", |m| m.as_str());
        cursor = tag_end;
        if attributes.trim_end().ends_with('/') {
            continue;
        }

        let Some(language) = LanguageId::from_tag(tag.as_str()) else {
            continue;
        };

        let Some(close) = language.closing_tag().find(&text[tag_end..]) else {
            tracing::debug!(
                offset = tag_start,
                language = language.as_str(),
                "skipping unterminated region"
            );
            continue;
        };

        let span = tag_end..tag_end + close.start();
        cursor = tag_end + close.end();

        if regions.iter().any(|r| r.language == language) {
            tracing::debug!(
                offset = tag_start,
                language = language.as_str(),
                "ignoring duplicate region"
            );
            continue;
        }

        let start = line_index.offset_to_position(span.start);
        regions.push(Region {
            language,
            span,
            origin: RegionOrigin::new(start.line, start.character),
        });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Region> {
        extract_regions(&LineIndex::new(text))
    }

    fn contents(text: &str) -> Vec<(LanguageId, &str)> {
        extract(text)
            .into_iter()
            .map(|r| (r.language, &text[r.span]))
            .collect()
    }

    #[test]
    fn extracts_script_and_style() {
        let text = "<html><div/></html>\n<script>\nlet a = 1;\n</script>\n<style>\n.a{}\n</style>\n";
        assert_eq!(
            contents(text),
            vec![
                (LanguageId::Script, "\nlet a = 1;\n"),
                (LanguageId::Style, "\n.a{}\n"),
            ]
        );
    }

    #[test]
    fn records_origin_of_first_content_byte() {
        let text = "<html></html>\n\n<style lang=\"css\">color: re</style>";
        let regions = extract(text);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].origin, RegionOrigin::new(2, 18));
        assert_eq!(regions[0].start_line(), 2);
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let text = "<SCRIPT type=\"module\">x</Script >";
        assert_eq!(contents(text), vec![(LanguageId::Script, "x")]);
    }

    #[test]
    fn missing_language_is_not_an_error() {
        assert!(extract("<html><p>hi</p></html>").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn unterminated_region_is_skipped() {
        let text = "<style>\n.a{}\n<script>let b;</script>";
        assert_eq!(contents(text), vec![(LanguageId::Script, "let b;")]);
    }

    #[test]
    fn comments_are_skipped() {
        let text = "<!-- <style>.x{}</style> -->\n<style>.y{}</style>";
        assert_eq!(contents(text), vec![(LanguageId::Style, ".y{}")]);
    }

    #[test]
    fn unterminated_comment_ends_scan() {
        let text = "<script>a</script><!-- <style>.x{}</style>";
        assert_eq!(contents(text), vec![(LanguageId::Script, "a")]);
    }

    #[test]
    fn custom_element_prefix_is_not_a_region() {
        let text = "<template><style-box>x</style-box><script-runner/></template>\n<style>\n.a{}\n</style>";
        let regions = extract(text);
        assert_eq!(regions.len(), 1);
        assert_eq!(&text[regions[0].span.clone()], "\n.a{}\n");
        assert_eq!(regions[0].origin, RegionOrigin::new(1, 7));
    }

    #[test]
    fn quoted_attributes_may_contain_angle_brackets() {
        let text = "<style data-x=\"a>b\" media='x>y'>.a{}</style>";
        assert_eq!(contents(text), vec![(LanguageId::Style, ".a{}")]);
    }

    #[test]
    fn self_closing_tag_has_no_region() {
        let text = "<script src=\"x.js\" /><script/><style>.a{}</style>";
        assert_eq!(contents(text), vec![(LanguageId::Style, ".a{}")]);
    }

    #[test]
    fn first_duplicate_wins() {
        let text = "<style>.first{}</style><style>.second{}</style>";
        assert_eq!(contents(text), vec![(LanguageId::Style, ".first{}")]);
    }

    #[test]
    fn style_tag_inside_script_does_not_overlap() {
        let text = "<script>const s = '<style>';</script><style>.a{}</style>";
        assert_eq!(
            contents(text),
            vec![
                (LanguageId::Script, "const s = '<style>';"),
                (LanguageId::Style, ".a{}"),
            ]
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "<script>\nlet a;\n</script>\n<style>\n.a { color: red }\n</style>";
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn contains_includes_end_bound() {
        let text = "<style>abc</style>";
        let region = &extract(text)[0];
        assert!(region.contains(7));
        assert!(region.contains(10));
        assert!(!region.contains(6));
        assert!(!region.contains(11));
    }
}
