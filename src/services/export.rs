//! Export encoders: pure functions from artifacts to text.

use crate::domain::{SitemapStructure, StyleGuide};

/// Base URL used in XML sitemaps when the sitemap does not name one
const DEFAULT_BASE_URL: &str = "https://example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapFormat {
    Json,
    Xml,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleFormat {
    Json,
    Css,
    Scss,
}

pub fn export_sitemap(sitemap: &SitemapStructure, format: SitemapFormat) -> serde_json::Result<String> {
    match format {
        SitemapFormat::Json => serde_json::to_string_pretty(sitemap),
        SitemapFormat::Xml => Ok(sitemap_xml(sitemap)),
        SitemapFormat::Csv => Ok(sitemap_csv(sitemap)),
    }
}

/// Parse a sitemap previously exported as JSON
pub fn parse_sitemap_json(text: &str) -> serde_json::Result<SitemapStructure> {
    serde_json::from_str(text)
}

pub fn export_style_guide(guide: &StyleGuide, format: StyleFormat) -> serde_json::Result<String> {
    match format {
        StyleFormat::Json => serde_json::to_string_pretty(guide),
        StyleFormat::Css => Ok(style_css(guide)),
        StyleFormat::Scss => Ok(style_scss(guide)),
    }
}

fn sitemap_xml(sitemap: &SitemapStructure) -> String {
    let base = sitemap
        .base_url
        .as_deref()
        .unwrap_or(DEFAULT_BASE_URL)
        .trim_end_matches('/');

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for page in sitemap.pages_depth_first() {
        out.push_str("  <url>\n");
        out.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&format!("{}{}", base, page.path))));
        out.push_str(&format!("    <changefreq>{}</changefreq>\n", page.changefreq.as_str()));
        out.push_str(&format!(
            "    <priority>{:.1}</priority>\n",
            f32::from(page.priority.min(10)) / 10.0
        ));
        out.push_str("  </url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn sitemap_csv(sitemap: &SitemapStructure) -> String {
    let mut out = String::from("id,title,path,parent_id,priority,changefreq,order\n");
    for page in sitemap.pages_depth_first() {
        let row = [
            csv_field(&page.id),
            csv_field(&page.title),
            csv_field(&page.path),
            csv_field(page.parent_id.as_deref().unwrap_or("")),
            page.priority.to_string(),
            page.changefreq.as_str().to_string(),
            page.order.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Flatten the style guide into (name, value) custom properties
fn style_variables(guide: &StyleGuide) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for (name, token) in &guide.color_palette {
        vars.push((format!("color-{}", name), token.value.clone()));
    }

    let typography = &guide.typography;
    if !typography.heading_font.is_empty() {
        vars.push(("font-heading".to_string(), typography.heading_font.clone()));
    }
    if !typography.body_font.is_empty() {
        vars.push(("font-body".to_string(), typography.body_font.clone()));
    }
    if let Some(mono) = &typography.mono_font {
        vars.push(("font-mono".to_string(), mono.clone()));
    }
    for (name, scale) in &typography.scale {
        vars.push((format!("font-size-{}", name), scale.size.clone()));
        vars.push((format!("line-height-{}", name), scale.line_height.clone()));
        vars.push((format!("font-weight-{}", name), scale.weight.to_string()));
    }

    for (name, value) in &guide.spacing {
        vars.push((format!("spacing-{}", name), value.clone()));
    }
    for (name, value) in &guide.border_radius {
        vars.push((format!("radius-{}", name), value.clone()));
    }
    for (name, value) in &guide.shadows {
        vars.push((format!("shadow-{}", name), value.clone()));
    }
    for (name, value) in &guide.css_variables {
        vars.push((name.trim_start_matches('-').to_string(), value.clone()));
    }

    vars
}

fn style_css(guide: &StyleGuide) -> String {
    let mut out = String::from(":root {\n");
    for (name, value) in style_variables(guide) {
        out.push_str(&format!("  --{}: {};\n", name, value));
    }
    out.push_str("}\n");
    out
}

fn style_scss(guide: &StyleGuide) -> String {
    style_variables(guide)
        .into_iter()
        .map(|(name, value)| format!("${}: {};\n", name, value))
        .collect()
}
