//! Shared XML helpers for the sitemap and feed encoders.

use thiserror::Error;

/// XML encoding errors.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The feed library refused to serialize.
    #[error("failed to encode {file}: {message}")]
    Encode { file: String, message: String },
}

/// Result type for XML encoding.
pub type Result<T> = std::result::Result<T, XmlError>;

impl XmlError {
    pub(crate) fn encode(file: &str, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            file: file.to_string(),
            message: err.to_string(),
        }
    }
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Insert an `xml-stylesheet` instruction after the XML declaration.
pub(crate) fn with_stylesheet(xml: String, href: Option<&str>) -> String {
    let Some(href) = href else {
        return xml;
    };

    let pi = format!("<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>", escape_xml(href));
    match xml.strip_prefix("<?xml").and_then(|rest| rest.find("?>")) {
        Some(end) => {
            // `end` is relative to the text after "<?xml".
            let split = "<?xml".len() + end + 2;
            format!("{}\n{pi}{}", &xml[..split], &xml[split..])
        }
        None => format!("{pi}\n{xml}"),
    }
}

/// Serialize through a feed library writer into a string.
pub(crate) fn into_string(file: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| XmlError::encode(file, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_xml("'q'"), "&apos;q&apos;");
    }

    #[test]
    fn test_with_stylesheet() {
        let xml = "<?xml version=\"1.0\"?><rss/>".to_string();
        assert_eq!(
            with_stylesheet(xml.clone(), Some("/s.xsl")),
            "<?xml version=\"1.0\"?>\n<?xml-stylesheet type=\"text/xsl\" href=\"/s.xsl\"?><rss/>"
        );
        assert_eq!(with_stylesheet(xml.clone(), None), xml);
        assert_eq!(
            with_stylesheet("<rss/>".to_string(), Some("a.xsl")),
            "<?xml-stylesheet type=\"text/xsl\" href=\"a.xsl\"?>\n<rss/>"
        );
    }
}
