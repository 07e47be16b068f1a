//! Sitemap generation.
//!
//! Writes the `urlset` by hand; the format is small enough not to need a
//! serializer.

use tracing::debug;

use crate::{
    model::{Sitemap, SitemapEntry},
    xml::escape_xml,
};

/// Render `sitemap.xml`.
#[must_use]
pub fn render(sitemap: &Sitemap) -> String {
    debug!(count = sitemap.entries.len(), "generating sitemap");

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    if let Some(xsl) = &sitemap.xsl {
        xml.push_str(&format!("<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>\n", escape_xml(xsl)));
    }
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for entry in &sitemap.entries {
        xml.push_str(&url_to_xml(entry));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn url_to_xml(entry: &SitemapEntry) -> String {
    let mut xml = String::from("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
    xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod.to_rfc3339()));
    xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
    xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
    xml.push_str("  </url>\n");
    xml
}
