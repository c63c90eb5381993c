use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// An `<a href>` element as seen by the crawler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Raw `href` attribute, possibly relative
    pub href: String,
    /// Trimmed visible text
    pub text: String,
    /// `aria-label` attribute, if any
    #[serde(default)]
    pub aria_label: Option<String>,
}

/// Content of a page after navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    /// Serialized DOM
    pub markup: String,
    /// Rendered visible text
    pub text: String,
    /// Anchors in document order
    pub anchors: Vec<Anchor>,
}

impl FetchedPage {
    /// Build a snapshot from static markup, deriving text and anchors with an HTML parser.
    ///
    /// Text nodes are joined with single spaces so adjacent elements never fuse
    /// into one token.
    #[must_use]
    pub fn from_markup(url: impl Into<String>, markup: impl Into<String>) -> Self {
        let url = url.into();
        let markup = markup.into();
        let document = Html::parse_document(&markup);

        let text = visible_text(&document);
        let anchors = document
            .select(&ANCHOR_SELECTOR)
            .filter_map(|element| {
                let href = element.value().attr("href")?.trim().to_string();
                Some(Anchor {
                    href,
                    text: collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")),
                    aria_label: element.value().attr("aria-label").map(str::to_string),
                })
            })
            .collect();

        Self {
            url,
            markup,
            text,
            anchors,
        }
    }
}

fn visible_text(document: &Html) -> String {
    collapse_whitespace(&document.root_element().text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
