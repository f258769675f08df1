use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::models::MetadataRecord;

static TITLE: Lazy<Selector> = Lazy::new(|| compile("title"));
static CANONICAL: Lazy<Selector> = Lazy::new(|| compile(r#"link[rel="canonical"]"#));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| meta_selector("description"));
static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| meta_selector("og:description"));
static KEYWORDS: Lazy<Selector> = Lazy::new(|| meta_selector("keywords"));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| meta_selector("og:image"));
static ROBOTS: Lazy<Selector> = Lazy::new(|| meta_selector("robots"));
static TWITTER_CARD: Lazy<Selector> = Lazy::new(|| meta_selector("twitter:card"));

/// Parse `markup` and pull out the SEO metadata tags.
///
/// Parsing is lenient (html5ever): malformed markup only ever results in more
/// fields being `None`. Values are returned exactly as written in the markup,
/// without trimming, and an empty `content=""` is a value, not an absence.
pub fn extract(markup: &str, source_url: &str) -> MetadataRecord {
    let document = Html::parse_document(markup);

    let description =
        meta_content(&document, &DESCRIPTION).or_else(|| meta_content(&document, &OG_DESCRIPTION));

    MetadataRecord {
        source_url: Some(source_url.to_string()),
        title: title_text(&document),
        description,
        keywords: meta_content(&document, &KEYWORDS),
        og_image: meta_content(&document, &OG_IMAGE),
        canonical_url: canonical_href(&document),
        robots: meta_content(&document, &ROBOTS),
        twitter_card: meta_content(&document, &TWITTER_CARD),
    }
}

/// Matches a `meta` element by either its `name` or its `property`
/// attribute. Open Graph and Twitter tags show up under both in the wild.
fn meta_selector(key: &str) -> Selector {
    compile(&format!(r#"meta[name="{key}"], meta[property="{key}"]"#))
}

// Selector sources are fixed strings, so a parse failure is a programming error.
fn compile(source: &str) -> Selector {
    Selector::parse(source).unwrap_or_else(|e| panic!("invalid selector {source:?}: {e:?}"))
}

// Selector groups are matched per element while walking the tree, so the
// first hit is the first matching element in document order.
fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

fn title_text(doc: &Html) -> Option<String> {
    doc.select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn canonical_href(doc: &Html) -> Option<String> {
    doc.select(&CANONICAL)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(str::to_string)
}
