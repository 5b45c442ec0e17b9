//! The singleton style guide shared by every page.

use crate::error::{StyleError, StyleResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn hex_color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
            .expect("static color pattern")
    })
}

/// Whether `value` is a `#rgb`, `#rrggbb` or `#rrggbbaa` color
pub fn is_hex_color(value: &str) -> bool {
    hex_color_pattern().is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorToken {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl ColorToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            usage: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeScale {
    pub size: String,
    pub line_height: String,
    pub weight: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mono_font: Option<String>,
    /// Named steps such as "h1", "body", "caption"
    #[serde(default)]
    pub scale: BTreeMap<String, TypeScale>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleGuide {
    /// Named color tokens, e.g. "primary" → #2563eb
    pub color_palette: BTreeMap<String, ColorToken>,
    pub typography: Typography,
    #[serde(default)]
    pub spacing: BTreeMap<String, String>,
    #[serde(default)]
    pub border_radius: BTreeMap<String, String>,
    #[serde(default)]
    pub shadows: BTreeMap<String, String>,
    /// Free-form per-component overrides, keyed by component name
    #[serde(default)]
    pub component_styles: BTreeMap<String, Value>,
    /// Extra custom properties, emitted verbatim by the CSS encoders
    #[serde(default)]
    pub css_variables: BTreeMap<String, String>,
}

/// Partial update for the style guide. Maps given here replace the existing
/// map for that section.
#[derive(Debug, Clone, Default)]
pub struct StyleGuideUpdate {
    pub color_palette: Option<BTreeMap<String, ColorToken>>,
    pub typography: Option<Typography>,
    pub spacing: Option<BTreeMap<String, String>>,
    pub border_radius: Option<BTreeMap<String, String>>,
    pub shadows: Option<BTreeMap<String, String>>,
    pub component_styles: Option<BTreeMap<String, Value>>,
    pub css_variables: Option<BTreeMap<String, String>>,
}

impl StyleGuide {
    pub fn apply(&mut self, update: StyleGuideUpdate) -> StyleResult<()> {
        if let Some(palette) = &update.color_palette {
            if let Some((name, token)) = palette.iter().find(|(_, t)| !is_hex_color(&t.value)) {
                return Err(StyleError::InvalidColor {
                    token: name.clone(),
                    value: token.value.clone(),
                });
            }
        }

        if let Some(palette) = update.color_palette {
            self.color_palette = palette;
        }
        if let Some(typography) = update.typography {
            self.typography = typography;
        }
        if let Some(spacing) = update.spacing {
            self.spacing = spacing;
        }
        if let Some(border_radius) = update.border_radius {
            self.border_radius = border_radius;
        }
        if let Some(shadows) = update.shadows {
            self.shadows = shadows;
        }
        if let Some(component_styles) = update.component_styles {
            self.component_styles = component_styles;
        }
        if let Some(css_variables) = update.css_variables {
            self.css_variables = css_variables;
        }
        Ok(())
    }

    /// Set a single color token, creating it if it does not exist
    pub fn set_color(&mut self, name: &str, value: &str) -> StyleResult<()> {
        if !is_hex_color(value) {
            return Err(StyleError::InvalidColor {
                token: name.to_string(),
                value: value.to_string(),
            });
        }
        self.color_palette
            .entry(name.to_string())
            .and_modify(|t| t.value = value.to_string())
            .or_insert_with(|| ColorToken::new(value));
        Ok(())
    }
}
