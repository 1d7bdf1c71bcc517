//! SEO metadata extraction from fetched HTML.
//!
//! Parsing goes through `scraper` (html5ever), which never fails on
//! malformed markup; a missing element simply yields `None`.

use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

const TITLE_SELECTOR: &str = "title";
const HEADING_SELECTOR: &str = "h1";
const META_DESCRIPTION_SELECTOR: &str = r#"meta[name="description"]"#;

/// Facts recorded for one successful inspection.
///
/// `None` means the element (or attribute) was absent; `Some("")` means it
/// was present but empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCheck {
    pub status_code: u16,
    pub title: Option<String>,
    pub heading: Option<String>,
    pub description: Option<String>,
    /// Local calendar date the page was parsed, `YYYY-MM-DD` on the wire.
    pub observed_at: NaiveDate,
}

/// Parse `html` into a [`PageCheck`].
///
/// ```
/// use analyzer_core::parse_page;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// let check = parse_page("<title>Hello</title><h1>World</h1>", 200, day);
/// assert_eq!(check.title.as_deref(), Some("Hello"));
/// assert_eq!(check.heading.as_deref(), Some("World"));
/// assert_eq!(check.description, None);
/// ```
pub fn parse_page(html: &str, status_code: u16, observed_at: NaiveDate) -> PageCheck {
    let document = Html::parse_document(html);

    PageCheck {
        status_code,
        title: first_text(&document, TITLE_SELECTOR),
        heading: first_text(&document, HEADING_SELECTOR),
        description: first_attr(&document, META_DESCRIPTION_SELECTOR, "content"),
        observed_at,
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr(attr)
        .map(str::to_owned)
}
