//! Permalink construction.

/// Join `parts` under `base` without ever doubling the slash at the seam.
///
/// An empty joined path returns `base` untouched. A missing trailing slash on
/// `base` is implied, and a leading slash on the path is dropped.
#[must_use]
pub fn build_url(base: &str, parts: &[&str]) -> String {
    let path = parts.join("/");
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }

    if base.is_empty() {
        return format!("/{path}");
    }

    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// URL of a file that lives inside a theme directory.
#[must_use]
pub fn theme_url(base: &str, theme: &str, parts: &[&str]) -> String {
    let mut all = vec![crate::source::THEMES_DIR, theme];
    all.extend_from_slice(parts);
    build_url(base, &all)
}

/// Path of a theme file relative to the site root.
#[must_use]
pub fn theme_path(theme: &str, file: &str) -> String {
    format!("{}/{theme}/{}", crate::source::THEMES_DIR, file.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_empty_path() {
        assert_eq!(build_url("https://example.com/", &[""]), "https://example.com/");
        assert_eq!(build_url("https://example.com", &[]), "https://example.com");
    }

    #[test]
    fn test_build_url_slashes() {
        let want = "https://example.com/p1/p2.md";
        assert_eq!(build_url("https://example.com/", &["/p1/p2.md"]), want);
        assert_eq!(build_url("https://example.com/", &["p1/p2.md"]), want);
        assert_eq!(build_url("https://example.com", &["p1/p2.md"]), want);
        assert_eq!(build_url("https://example.com", &["p1", "p2.md"]), want);
        assert_eq!(build_url("https://example.com/blog", &["tags.html"]), "https://example.com/blog/tags.html");
    }

    #[test]
    fn test_build_url_idempotent_on_result() {
        let once = build_url("https://example.com/", &["/a"]);
        assert_eq!(build_url(&once, &[""]), once);
    }

    #[test]
    fn test_build_url_without_base() {
        assert_eq!(build_url("", &["p1", "p2.md"]), "/p1/p2.md");
    }

    #[test]
    fn test_theme_url() {
        assert_eq!(
            theme_url("https://example.com", "default", &["rss.xsl"]),
            "https://example.com/themes/default/rss.xsl"
        );
        assert_eq!(theme_path("default", "/layout/post.html"), "themes/default/layout/post.html");
    }
}
