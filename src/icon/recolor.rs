//! SVG recoloring
//!
//! Replaces white fills in a light-variant icon with a caller-supplied color.
//! The document is parsed so that only real `fill` attributes and `fill:`
//! declarations inside `style` attributes are touched; every edit is spliced
//! back into the original text, leaving the rest of the file byte-for-byte.
//! Documents that do not parse fall back to plain pattern substitution.

use regex::{Captures, NoExpand, Regex};
use roxmltree::{Document, ParsingOptions};
use std::ops::Range;
use std::sync::OnceLock;

/// Result of a recolor pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recolored {
    pub svg: String,
    /// Number of fills rewritten
    pub replaced: usize,
    /// Whether the pattern fallback was used
    pub textual: bool,
}

/// Prefix `#` unless already present
pub fn normalize_color(raw: &str) -> String {
    let color = raw.trim();
    if color.starts_with('#') {
        color.to_string()
    } else {
        format!("#{color}")
    }
}

/// Rewrite white fills in `svg` to `color` (already normalized)
pub fn recolor_svg(svg: &str, color: &str) -> Recolored {
    let escaped = escape_attr(color);
    recolor_structural(svg, color, &escaped).unwrap_or_else(|| recolor_textual(svg, &escaped))
}

fn recolor_structural(svg: &str, color: &str, escaped: &str) -> Option<Recolored> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(svg, options).ok()?;

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut replaced = 0;

    for node in doc.descendants().filter(roxmltree::Node::is_element) {
        for attr in node.attributes() {
            if attr.namespace().is_some() {
                continue;
            }
            let range = value_range(svg, attr.range_value());
            match attr.name() {
                "fill" if is_white(attr.value()) => {
                    edits.push((range, escaped.to_string()));
                    replaced += 1;
                }
                "style" => {
                    let raw = &svg[range.clone()];
                    // Entity references can hide `#` and `;`, so match on the
                    // decoded value and re-escape the whole attribute
                    let rewritten = if raw.contains('&') {
                        rewrite_style(attr.value(), color)
                            .map(|(style, count)| (escape_attr(&style), count))
                    } else {
                        rewrite_style(raw, escaped)
                    };
                    if let Some((style, count)) = rewritten {
                        edits.push((range, style));
                        replaced += count;
                    }
                }
                _ => {}
            }
        }
    }

    Some(Recolored {
        svg: splice(svg, edits),
        replaced,
        textual: false,
    })
}

/// Attribute value range without surrounding quotes
fn value_range(svg: &str, range: Range<usize>) -> Range<usize> {
    let raw = &svg[range.clone()];
    let quoted = raw.len() >= 2
        && (raw.starts_with('"') && raw.ends_with('"')
            || raw.starts_with('\'') && raw.ends_with('\''));
    if quoted {
        range.start + 1..range.end - 1
    } else {
        range
    }
}

/// Apply non-overlapping edits given in document order
fn splice(svg: &str, edits: Vec<(Range<usize>, String)>) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&svg[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&svg[cursor..]);
    out
}

/// Rewrite white `fill:` declarations of a style attribute value
fn rewrite_style(style: &str, color: &str) -> Option<(String, usize)> {
    let mut count = 0;
    let declarations: Vec<String> = style
        .split(';')
        .map(|decl| {
            let Some((prop, value)) = decl.split_once(':') else {
                return decl.to_string();
            };
            if !prop.trim().eq_ignore_ascii_case("fill") {
                return decl.to_string();
            }
            let (value, important) = split_important(value);
            if !is_white(value) {
                return decl.to_string();
            }
            count += 1;
            let indent = &prop[..prop.len() - prop.trim_start().len()];
            format!("{indent}fill:{color}{important}")
        })
        .collect();

    (count > 0).then(|| (declarations.join(";"), count))
}

/// Split a trailing `!important` (with its leading whitespace) off a CSS value
fn split_important(value: &str) -> (&str, &str) {
    let trimmed = value.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    match lower.strip_suffix("!important") {
        Some(rest) => {
            let end = rest.trim_end().len();
            (&trimmed[..end], &trimmed[end..])
        }
        None => (value, ""),
    }
}

/// Whether a fill value denotes plain white
fn is_white(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(
        compact.as_str(),
        "#fff" | "#ffffff" | "white" | "rgb(255,255,255)"
    )
}

/// Escape a value for use inside a double- or single-quoted XML attribute
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn style_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)style="[^"]*fill:\s*#fff(?:fff)?\b[^"]*""#).expect("style pattern is valid")
    })
}

fn style_fill_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)fill:\s*#fff(?:fff)?\b").expect("fill pattern is valid"))
}

fn fill_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r##"(?i)fill="#fff(?:fff)?""##).expect("fill pattern is valid"))
}

/// Pattern substitution for documents the XML parser rejects
fn recolor_textual(svg: &str, color: &str) -> Recolored {
    let mut replaced = 0;

    let styled = style_attr_re().replace_all(svg, |caps: &Captures| {
        let attr = &caps[0];
        replaced += style_fill_re().find_iter(attr).count();
        style_fill_re()
            .replace_all(attr, NoExpand(&format!("fill:{color}")))
            .into_owned()
    });

    replaced += fill_attr_re().find_iter(&styled).count();
    let svg = fill_attr_re()
        .replace_all(&styled, NoExpand(&format!("fill=\"{color}\"")))
        .into_owned();

    Recolored {
        svg,
        replaced,
        textual: true,
    }
}
