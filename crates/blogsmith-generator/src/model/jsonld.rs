//! schema.org structured data embedded in post pages.

use blogsmith_core::{CoreError, Post, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

const CONTEXT: &str = "https://schema.org/";

#[derive(Debug, Serialize)]
struct Blog<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    #[serde(rename = "author", skip_serializing_if = "Vec::is_empty")]
    authors: Vec<Person<'a>>,
    #[serde(rename = "dateCreated")]
    created: DateTime<Utc>,
    #[serde(rename = "dateModified")]
    modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    keywords: &'a str,
    #[serde(rename = "inLanguage", skip_serializing_if = "str::is_empty")]
    language: &'a str,
}

#[derive(Debug, Serialize)]
struct Person<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

/// JSON-LD for `post`, or its front matter block when it has one.
///
/// `keywords` are the resolved keywords, tag fallback included. `<` is
/// escaped so the result can sit inside a `<script>` element.
pub(crate) fn post_ld(post: &Post, keywords: &str) -> Result<String> {
    if let Some(ld) = &post.jsonld {
        return Ok(ld.clone());
    }

    let blog = Blog {
        context: CONTEXT,
        kind: "Blog",
        name: &post.title,
        authors: post
            .authors
            .iter()
            .map(|a| Person {
                kind: "Person",
                name: &a.name,
                email: a.email.as_deref(),
                url: a.url.as_deref(),
            })
            .collect(),
        created: post.created,
        modified: post.modified,
        license: &post.license.url,
        keywords,
        language: &post.language,
    };

    let json = serde_json::to_string(&blog)
        .map_err(|e| CoreError::validation(&post.path, "jsonld", e.to_string()))?;
    Ok(json.replace('<', "\\u003c"))
}

#[cfg(test)]
mod tests {
    use blogsmith_core::PostState;

    use super::{super::tests::*, *};

    #[test]
    fn test_generated_blog() {
        let mut p = post("hello", date(2024, 1, 1), PostState::Default, &["rust"]);
        p.title = "Hello </script>".to_string();

        let ld = post_ld(&p, "rust,RUST").expect("json-ld");
        let value: serde_json::Value = serde_json::from_str(&ld).expect("valid json");

        assert_eq!(value["@context"], "https://schema.org/");
        assert_eq!(value["@type"], "Blog");
        assert_eq!(value["name"], "Hello </script>");
        assert_eq!(value["author"][0]["@type"], "Person");
        assert_eq!(value["author"][0]["name"], "alice");
        assert!(value["author"][0].get("email").is_none());
        assert_eq!(value["dateCreated"], "2024-01-01T12:00:00Z");
        assert_eq!(value["license"], "https://creativecommons.org/licenses/by/4.0/");
        assert_eq!(value["keywords"], "rust,RUST");
        assert_eq!(value["inLanguage"], "en");
        assert!(!ld.contains("</script>"));
    }

    #[test]
    fn test_front_matter_block_wins() {
        let mut p = post("hello", date(2024, 1, 1), PostState::Default, &[]);
        p.jsonld = Some("{\"@context\": \"https://schema.org/\"}".to_string());
        assert_eq!(post_ld(&p, "").expect("json-ld"), "{\"@context\": \"https://schema.org/\"}");
    }
}
