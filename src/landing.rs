/**
 * Landing and Listing Pages
 *
 * The two HTML pages the browse branch renders itself.
 *
 * A tenant whose tree holds no files yet gets a short welcome page: it
 * greets the authenticated identity (when there is one) and links the URL
 * that would create a first document, so the flow from "empty account" to
 * "working document" is a single click in the address bar.
 *
 * Directories without an `index.html` get a plain pre-formatted listing
 * of links, one per entry, directories marked with a trailing slash.
 */

use axum::response::Html;

use crate::tenant::ListingEntry;

/// Document name suggested to tenants with an empty tree.
pub const DEFAULT_DOCUMENT: &str = "wiki.html";

/// Renders the empty-tree welcome page.
#[derive(Debug, Clone)]
pub struct LandingPresenter {
    base_url: String,
}

impl LandingPresenter {
    /// # Arguments
    ///
    /// * `base_url` - Externally reachable server URL, no trailing slash
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// URL that creates the suggested first document.
    pub fn suggested_url(&self) -> String {
        format!("{}/{}", self.base_url, DEFAULT_DOCUMENT)
    }

    /// Render the welcome page for `tenant`; an empty tenant (anonymous
    /// mode) drops the name from the greeting.
    pub fn render(&self, tenant: &str) -> Html<String> {
        let greeting = if tenant.is_empty() {
            String::new()
        } else {
            format!(" {tenant}")
        };
        let url = self.suggested_url();
        Html(format!(
            r#"
<h1>Hello{greeting}! Welcome to warren!</h1>

<p>To create a new document, simply append an html file name to the URL in the address bar!</p>

<h3>For example:</h3>

<a href="{url}">{url}</a>

<p>This will create a new document called "<b>{DEFAULT_DOCUMENT}</b>"</p>

<p>After creating a document, this message will be replaced by a list of your files.</p>
"#
        ))
    }
}

/// Render a directory listing. Links are absolute, built from the request
/// path, so the page works with or without a trailing slash in the URL.
pub fn render_listing(request_path: &str, entries: &[ListingEntry]) -> Html<String> {
    let prefix = request_path.trim_end_matches('/');
    let mut body = String::from("<pre>\n");
    for entry in entries {
        let slash = if entry.is_dir { "/" } else { "" };
        let name = escape_html(&entry.name);
        body.push_str(&format!(
            "<a href=\"{prefix}/{name}{slash}\">{name}{slash}</a>\n"
        ));
    }
    body.push_str("</pre>\n");
    Html(body)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
