//! CSS property reference data for completion and hover.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Documentation-only definition of a CSS property.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: &'static str,
    pub description: &'static str,
    /// Keyword values offered after the colon.
    pub values: &'static [&'static str],
    /// Whether named colors are valid values.
    pub accepts_color: bool,
}

const GLOBAL_VALUES: &[&str] = &["inherit", "initial", "unset", "revert"];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// Known properties, lazily indexed by name.
pub static PROPERTIES: LazyLock<HashMap<&'static str, PropertyDef>> = LazyLock::new(|| {
    let defs = vec![
        // ==================== Color ====================
        PropertyDef {
            name: "color",
            description: "Sets the color of an element's text.",
            values: &["currentcolor", "transparent"],
            accepts_color: true,
        },
        PropertyDef {
            name: "background",
            description: "Shorthand for setting all background properties at once.",
            values: &["none", "transparent"],
            accepts_color: true,
        },
        PropertyDef {
            name: "background-color",
            description: "Sets the background color of an element.",
            values: &["currentcolor", "transparent"],
            accepts_color: true,
        },
        PropertyDef {
            name: "border-color",
            description: "Sets the color of all four sides of an element's border.",
            values: &["currentcolor", "transparent"],
            accepts_color: true,
        },
        PropertyDef {
            name: "outline-color",
            description: "Sets the color of an element's outline.",
            values: &["currentcolor", "invert"],
            accepts_color: true,
        },
        PropertyDef {
            name: "opacity",
            description: "Sets the opacity of an element, from 0 (transparent) to 1 (opaque).",
            values: &[],
            accepts_color: false,
        },
        // ==================== Box model ====================
        PropertyDef {
            name: "display",
            description: "Sets whether an element is treated as a block or inline box and the layout used for its children.",
            values: &[
                "block", "inline", "inline-block", "flex", "inline-flex", "grid", "inline-grid",
                "contents", "none", "table", "list-item",
            ],
            accepts_color: false,
        },
        PropertyDef {
            name: "width",
            description: "Sets an element's width.",
            values: &["auto", "min-content", "max-content", "fit-content"],
            accepts_color: false,
        },
        PropertyDef {
            name: "height",
            description: "Sets an element's height.",
            values: &["auto", "min-content", "max-content", "fit-content"],
            accepts_color: false,
        },
        PropertyDef {
            name: "min-width",
            description: "Sets the minimum width of an element.",
            values: &["auto", "min-content", "max-content"],
            accepts_color: false,
        },
        PropertyDef {
            name: "max-width",
            description: "Sets the maximum width of an element.",
            values: &["none", "min-content", "max-content"],
            accepts_color: false,
        },
        PropertyDef {
            name: "margin",
            description: "Sets the margin area on all four sides of an element.",
            values: &["auto"],
            accepts_color: false,
        },
        PropertyDef {
            name: "padding",
            description: "Sets the padding area on all four sides of an element.",
            values: &[],
            accepts_color: false,
        },
        PropertyDef {
            name: "border",
            description: "Shorthand for border width, style and color.",
            values: BORDER_STYLES,
            accepts_color: true,
        },
        PropertyDef {
            name: "border-style",
            description: "Sets the line style for all four sides of an element's border.",
            values: BORDER_STYLES,
            accepts_color: false,
        },
        PropertyDef {
            name: "border-radius",
            description: "Rounds the corners of an element's outer border edge.",
            values: &[],
            accepts_color: false,
        },
        PropertyDef {
            name: "box-sizing",
            description: "Sets how the total width and height of an element is calculated.",
            values: &["content-box", "border-box"],
            accepts_color: false,
        },
        PropertyDef {
            name: "overflow",
            description: "Sets the desired behavior when content does not fit in the element's padding box.",
            values: &["visible", "hidden", "clip", "scroll", "auto"],
            accepts_color: false,
        },
        // ==================== Positioning ====================
        PropertyDef {
            name: "position",
            description: "Sets how an element is positioned in a document.",
            values: &["static", "relative", "absolute", "fixed", "sticky"],
            accepts_color: false,
        },
        PropertyDef {
            name: "top",
            description: "Sets the vertical position of a positioned element.",
            values: &["auto"],
            accepts_color: false,
        },
        PropertyDef {
            name: "left",
            description: "Sets the horizontal position of a positioned element.",
            values: &["auto"],
            accepts_color: false,
        },
        PropertyDef {
            name: "z-index",
            description: "Sets the z-order of a positioned element and its descendants.",
            values: &["auto"],
            accepts_color: false,
        },
        // ==================== Flexbox & grid ====================
        PropertyDef {
            name: "flex-direction",
            description: "Sets how flex items are placed in the flex container.",
            values: &["row", "row-reverse", "column", "column-reverse"],
            accepts_color: false,
        },
        PropertyDef {
            name: "justify-content",
            description: "Defines how space is distributed between and around content items along the main axis.",
            values: &[
                "flex-start", "flex-end", "center", "space-between", "space-around", "space-evenly",
                "start", "end",
            ],
            accepts_color: false,
        },
        PropertyDef {
            name: "align-items",
            description: "Sets the alignment of items on the cross axis.",
            values: &["stretch", "flex-start", "flex-end", "center", "baseline", "start", "end"],
            accepts_color: false,
        },
        PropertyDef {
            name: "gap",
            description: "Sets the gaps between rows and columns.",
            values: &["normal"],
            accepts_color: false,
        },
        PropertyDef {
            name: "grid-template-columns",
            description: "Defines the line names and track sizing functions of the grid columns.",
            values: &["none", "subgrid", "auto"],
            accepts_color: false,
        },
        // ==================== Text ====================
        PropertyDef {
            name: "font-family",
            description: "Specifies a prioritized list of font family names.",
            values: &["serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui"],
            accepts_color: false,
        },
        PropertyDef {
            name: "font-size",
            description: "Sets the size of the font.",
            values: &[
                "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller",
                "larger",
            ],
            accepts_color: false,
        },
        PropertyDef {
            name: "font-weight",
            description: "Sets the weight (or boldness) of the font.",
            values: &["normal", "bold", "bolder", "lighter"],
            accepts_color: false,
        },
        PropertyDef {
            name: "line-height",
            description: "Sets the height of a line box.",
            values: &["normal"],
            accepts_color: false,
        },
        PropertyDef {
            name: "text-align",
            description: "Sets the horizontal alignment of inline content.",
            values: &["left", "right", "center", "justify", "start", "end"],
            accepts_color: false,
        },
        PropertyDef {
            name: "text-decoration",
            description: "Sets the appearance of decorative lines on text.",
            values: &["none", "underline", "overline", "line-through"],
            accepts_color: true,
        },
        PropertyDef {
            name: "white-space",
            description: "Sets how white space inside an element is handled.",
            values: &["normal", "nowrap", "pre", "pre-wrap", "pre-line", "break-spaces"],
            accepts_color: false,
        },
        // ==================== Misc ====================
        PropertyDef {
            name: "cursor",
            description: "Sets the mouse cursor shown when hovering over an element.",
            values: &["auto", "default", "pointer", "text", "move", "not-allowed", "wait", "grab"],
            accepts_color: false,
        },
        PropertyDef {
            name: "visibility",
            description: "Shows or hides an element without changing the layout.",
            values: &["visible", "hidden", "collapse"],
            accepts_color: false,
        },
        PropertyDef {
            name: "transition",
            description: "Shorthand for transition-property, duration, timing function and delay.",
            values: &["none", "all", "ease", "ease-in", "ease-out", "ease-in-out", "linear"],
            accepts_color: false,
        },
        PropertyDef {
            name: "box-shadow",
            description: "Adds shadow effects around an element's frame.",
            values: &["none", "inset"],
            accepts_color: true,
        },
    ];

    defs.into_iter().map(|def| (def.name, def)).collect()
});

pub fn get_property(name: &str) -> Option<&'static PropertyDef> {
    PROPERTIES.get(name.to_ascii_lowercase().as_str())
}

/// Custom properties and vendor-prefixed names are never reported unknown.
pub fn is_known_property(name: &str) -> bool {
    name.starts_with("--") || name.starts_with('-') || get_property(name).is_some()
}

pub fn global_values() -> &'static [&'static str] {
    GLOBAL_VALUES
}

/// Element names offered at selector positions.
pub const HTML_ELEMENTS: &[&str] = &[
    "a", "article", "aside", "body", "button", "div", "footer", "form", "h1", "h2", "h3", "header",
    "img", "input", "label", "li", "main", "nav", "ol", "p", "section", "select", "span", "table",
    "td", "textarea", "th", "tr", "ul",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(get_property("COLOR").map(|p| p.name), Some("color"));
    }

    #[test]
    fn custom_and_vendor_properties_are_known() {
        assert!(is_known_property("--brand"));
        assert!(is_known_property("-webkit-appearance"));
        assert!(!is_known_property("colr"));
    }
}
