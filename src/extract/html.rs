//! HTML-based extraction strategies.
//!
//! [`ArticleStrategy`] looks for a readable article root (`article`,
//! `[role=main]`, `main`) and reads headings, paragraphs, list items and
//! quotes from it. [`MarkupScanStrategy`] is the blunt fallback: the `<title>` element and
//! every `<p>` in the document.

use super::ExtractionStrategy;
use super::fetch::{ACCEPT_HTML, PageFetcher};
use crate::document::{ExtractedDocument, compact_ws};
use crate::error::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

const ARTICLE_ROOTS: [&str; 3] = ["article", "[role=main]", "main"];
const ARTICLE_BLOCKS: &str = "p, h2, h3, li, blockquote";

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn text_content(elem: ElementRef<'_>) -> String {
    compact_ws(&elem.text().collect::<Vec<_>>().join(" "))
}

fn document_title(document: &Html) -> String {
    selector("title")
        .and_then(|sel| document.select(&sel).next())
        .map(text_content)
        .unwrap_or_default()
}

/// Text of every block under `root` matching `css`. A block nested inside
/// another matching block is already covered by its outer block's text.
fn block_texts(root: ElementRef<'_>, css: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    root.select(&sel)
        .filter(|elem| {
            !elem
                .ancestors()
                .take_while(|node| node.id() != root.id())
                .filter_map(ElementRef::wrap)
                .any(|outer| sel.matches(&outer))
        })
        .map(text_content)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a page as an article. `None` when the page has no article root.
pub fn parse_article(html: &str) -> Option<ExtractedDocument> {
    let document = Html::parse_document(html);

    // Of the first root kind present, keep the element carrying the most text.
    let root = ARTICLE_ROOTS.iter().find_map(|css| {
        let sel = selector(css)?;
        document
            .select(&sel)
            .max_by_key(|elem| block_texts(*elem, "p").iter().map(|t| t.len()).sum::<usize>())
    })?;

    let og_title = selector("meta[property=\"og:title\"]")
        .and_then(|sel| document.select(&sel).next())
        .and_then(|meta| meta.value().attr("content"))
        .map(compact_ws)
        .filter(|t| !t.is_empty());

    let title = og_title
        .or_else(|| {
            selector("h1")
                .and_then(|sel| root.select(&sel).next())
                .map(text_content)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| document_title(&document));

    let body = block_texts(root, ARTICLE_BLOCKS).join("\n");
    Some(ExtractedDocument::new(title, body))
}

/// Title element plus every paragraph in the document, one per line.
pub fn parse_paragraphs(html: &str) -> ExtractedDocument {
    let document = Html::parse_document(html);
    let title = document_title(&document);
    let body = block_texts(document.root_element(), "p").join("\n");
    ExtractedDocument::new(title, body)
}

/// Readability-style article extraction.
pub struct ArticleStrategy {
    fetcher: Arc<dyn PageFetcher>,
}

impl ArticleStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for ArticleStrategy {
    fn name(&self) -> &'static str {
        "article"
    }

    async fn extract(&self, url: &str) -> Result<Option<ExtractedDocument>> {
        let html = self.fetcher.fetch(url, ACCEPT_HTML).await?;
        Ok(parse_article(&html))
    }
}

/// Generic fetch and `<p>` scan.
pub struct MarkupScanStrategy {
    fetcher: Arc<dyn PageFetcher>,
}

impl MarkupScanStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for MarkupScanStrategy {
    fn name(&self) -> &'static str {
        "markup-scan"
    }

    async fn extract(&self, url: &str) -> Result<Option<ExtractedDocument>> {
        let html = self.fetcher.fetch(url, ACCEPT_HTML).await?;
        Ok(Some(parse_paragraphs(&html)))
    }
}
