//! Icon path parsing
//!
//! Turns `/<filename>.<ext>?color=<value>` into a plan describing which
//! asset to fetch and whether it needs recoloring.

use regex::Regex;
use std::sync::OnceLock;

use super::recolor::normalize_color;
use crate::http::mime;

/// Supported icon formats. Each lives in a directory named after itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Webp,
    Svg,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub const fn dir(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        mime::get_content_type(Some(self.dir()))
    }
}

/// Why a path could not be mapped to an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    MissingExtension,
    UnsupportedFormat,
}

impl RouteError {
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingExtension => "File extension missing",
            Self::UnsupportedFormat => "Format not supported",
        }
    }
}

/// What the handler has to do for one icon request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Serve `path` from the source as-is
    Serve { path: String, format: Format },
    /// Recolor `light_path` if it exists, otherwise fall back to `plain_path`
    Recolor {
        light_path: String,
        plain_path: String,
        color: String,
    },
}

/// A parsed icon request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    /// Path without the leading slash, case preserved
    pub filename: String,
    pub format: Format,
    /// Raw `color` query value, trimmed; `None` when absent or blank
    pub color: Option<String>,
}

fn extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([A-Za-z0-9_]+)$").expect("extension pattern is valid"))
}

impl IconRequest {
    /// Parse a request path and its (undecoded) query string
    pub fn parse(path: &str, query: Option<&str>) -> Result<Self, RouteError> {
        let ext = extension_re()
            .captures(path)
            .and_then(|c| c.get(1))
            .ok_or(RouteError::MissingExtension)?;
        let format = Format::from_extension(ext.as_str()).ok_or(RouteError::UnsupportedFormat)?;

        Ok(Self {
            filename: path.strip_prefix('/').unwrap_or(path).to_string(),
            format,
            color: query.and_then(color_param),
        })
    }

    /// Pre-made `-light.svg` / `-dark.svg` files are never recolored
    pub fn is_theme_variant(&self) -> bool {
        let lower = self.filename.to_ascii_lowercase();
        lower.ends_with("-light.svg") || lower.ends_with("-dark.svg")
    }

    /// Filename with its trailing `.png` / `.webp` / `.svg` removed
    pub fn base_name(&self) -> &str {
        let len = self.filename.len();
        [".png", ".webp", ".svg"]
            .iter()
            .find(|suffix| {
                len >= suffix.len()
                    && self.filename.is_char_boundary(len - suffix.len())
                    && self.filename[len - suffix.len()..].eq_ignore_ascii_case(suffix)
            })
            .map_or(self.filename.as_str(), |suffix| {
                &self.filename[..len - suffix.len()]
            })
    }

    /// Location of the requested file inside the source
    pub fn asset_path(&self) -> String {
        format!("{}/{}", self.format.dir(), self.filename)
    }

    pub fn plan(&self) -> Plan {
        if self.is_theme_variant() {
            return Plan::Serve {
                path: format!("{}/{}", Format::Svg.dir(), self.filename),
                format: Format::Svg,
            };
        }

        match (&self.color, self.format) {
            (Some(color), Format::Svg) => Plan::Recolor {
                light_path: format!("{}/{}-light.svg", Format::Svg.dir(), self.base_name()),
                plain_path: self.asset_path(),
                color: normalize_color(color),
            },
            _ => Plan::Serve {
                path: self.asset_path(),
                format: self.format,
            },
        }
    }
}

/// First `color` parameter, decoded and trimmed; blank counts as absent
fn color_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "color")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
