//! HTML preparation for rendering.
//!
//! Isolates the `<body>` content of a fetched document and pulls every
//! `<script>` element out of it, so the markup can be inserted without the
//! scripts and the scripts replayed separately.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

// ============================================================================
// Patterns
// ============================================================================

static BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|\z)").expect("valid body pattern")
});

static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("valid script pattern")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute pattern")
});

// ============================================================================
// ScriptElement
// ============================================================================

/// A `<script>` element extracted from page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    /// `src` attribute.
    pub src: Option<String>,
    /// `data-hook` attribute.
    pub hook: Option<String>,
    /// Inline text.
    pub text: String,
}

impl ScriptElement {
    /// Returns `true` for scripts loaded from `src`.
    #[inline]
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.src.is_some()
    }

    /// Name of the page hook an inline script declares.
    ///
    /// The `data-hook` attribute wins; otherwise the trimmed script text is
    /// the hook name. Empty inline scripts declare nothing.
    #[must_use]
    pub fn declared_hook(&self) -> Option<&str> {
        if self.is_external() {
            return None;
        }
        self.hook
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| Some(self.text.trim()).filter(|text| !text.is_empty()))
    }

    fn parse(attributes: &str, text: &str) -> Self {
        let mut src = None;
        let mut hook = None;

        for caps in ATTRIBUTE.captures_iter(attributes) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());

            match caps[1].to_ascii_lowercase().as_str() {
                "src" => src = Some(value.to_string()),
                "data-hook" => hook = Some(value.to_string()),
                _ => {}
            }
        }

        Self {
            src,
            hook,
            text: text.to_string(),
        }
    }
}

// ============================================================================
// PreparedPage
// ============================================================================

/// Page content split into insertable markup and scripts to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPage {
    /// Body content with every script removed.
    pub markup: String,
    /// Extracted scripts in document order.
    pub scripts: Vec<ScriptElement>,
}

/// Splits a fetched document into markup and scripts.
///
/// Uses the `<body>` content when the document has one, the whole text
/// otherwise.
#[must_use]
pub fn prepare(html: &str) -> PreparedPage {
    let body = BODY
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map_or(html, |m| m.as_str());

    let scripts = SCRIPT
        .captures_iter(body)
        .map(|caps| ScriptElement::parse(&caps[1], &caps[2]))
        .collect();

    let markup = SCRIPT.replace_all(body, "").into_owned();

    PreparedPage { markup, scripts }
}

/// Escapes text for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_isolates_body_and_strips_scripts() {
        let page = prepare("<body><h1>Hi</h1><script>window.flag=1</script></body>");

        assert_eq!(page.markup, "<h1>Hi</h1>");
        assert_eq!(page.scripts.len(), 1);
        assert_eq!(page.scripts[0].declared_hook(), Some("window.flag=1"));
    }

    #[test]
    fn test_full_document() {
        let html = r#"<!DOCTYPE html>
<html><head><title>T</title><script src="head.js"></script></head>
<body class="page"><main>content</main>
<script src="vendor.js"></script>
<script data-hook="init-home"></script>
</body></html>"#;
        let page = prepare(html);

        assert!(page.markup.contains("<main>content</main>"));
        assert!(!page.markup.contains("<script"));
        assert!(!page.markup.contains("<title>"));

        let srcs: Vec<_> = page.scripts.iter().filter_map(|s| s.src.as_deref()).collect();
        assert_eq!(srcs, vec!["vendor.js"]);
        assert_eq!(page.scripts[1].declared_hook(), Some("init-home"));
    }

    #[test]
    fn test_unclosed_body() {
        let page = prepare("<html><head><title>T</title></head><body class=\"x\"><p>x</p><script>late</script>");
        assert_eq!(page.markup, "<p>x</p>");
        assert_eq!(page.scripts[0].declared_hook(), Some("late"));
    }

    #[test]
    fn test_fragment_without_body() {
        let page = prepare("<p>a</p><SCRIPT type='text/javascript'> setup </SCRIPT><p>b</p>");
        assert_eq!(page.markup, "<p>a</p><p>b</p>");
        assert_eq!(page.scripts[0].declared_hook(), Some("setup"));
    }

    #[test]
    fn test_external_and_empty_scripts_declare_no_hook() {
        let page = prepare(r#"<script src=app.js></script><script>   </script>"#);
        assert_eq!(page.scripts[0].src.as_deref(), Some("app.js"));
        assert_eq!(page.scripts[0].declared_hook(), None);
        assert_eq!(page.scripts[1].declared_hook(), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    proptest! {
        #[test]
        fn prop_markup_never_contains_scripts(
            parts in prop::collection::vec("[a-z ]{0,12}", 1..6),
            names in prop::collection::vec("[a-z]{1,8}", 1..6),
        ) {
            let mut body = String::new();
            for (text, name) in parts.iter().zip(names.iter()) {
                body.push_str(&format!("<p>{text}</p><script>{name}</script>"));
            }
            let page = prepare(&format!("<html><body>{body}</body></html>"));

            prop_assert!(!page.markup.contains("<script"));
            prop_assert_eq!(page.scripts.len(), parts.len().min(names.len()));
            for (script, name) in page.scripts.iter().zip(names.iter()) {
                prop_assert_eq!(script.declared_hook(), Some(name.as_str()));
            }
        }
    }
}
