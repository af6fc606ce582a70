//! Sitemap XML decoder
//!
//! Classifies a fetched document by its root element and extracts either
//! child sitemap locations or page entries. Decoding is total: any input,
//! including truncated or non-XML bytes, produces a [`DecodedDocument`].
//!
//! Element names are matched on their local part only, so documents with
//! missing or nonstandard namespace declarations decode the same way as
//! conforming ones. Extension elements such as `image:loc` are nested
//! deeper than `url/loc` and never mistaken for page URLs.

use quick_xml::events::Event;
use quick_xml::Reader;

/// One `<url>` entry of a URL set, as written in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// The typed shape of a sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedDocument {
    /// `<sitemapindex>` with its child `<loc>` values in document order
    Index { children: Vec<String> },

    /// `<urlset>` with its entries in document order
    UrlSet { entries: Vec<SitemapEntry> },

    /// Anything else, with a diagnostic reason
    Malformed { reason: String },
}

impl DecodedDocument {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Index,
    UrlSet,
}

/// Which text field the reader is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    Lastmod,
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Decodes a sitemap document
///
/// # Example
///
/// ```
/// use sitemap_harvest::harvester::{decode, DecodedDocument};
///
/// let doc = decode(b"<urlset><url><loc>https://example.com/</loc></url></urlset>");
/// assert!(matches!(doc, DecodedDocument::UrlSet { ref entries } if entries.len() == 1));
/// ```
pub fn decode(bytes: &[u8]) -> DecodedDocument {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut root: Option<RootKind> = None;

    let mut children = Vec::new();
    let mut entries = Vec::new();

    let mut field: Option<Field> = None;
    let mut text = String::new();
    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.local_name().as_ref());

                if stack.is_empty() {
                    if root.is_some() {
                        return DecodedDocument::malformed("multiple root elements");
                    }
                    root = match name.as_str() {
                        "sitemapindex" => Some(RootKind::Index),
                        "urlset" => Some(RootKind::UrlSet),
                        other => {
                            return DecodedDocument::malformed(format!(
                                "unrecognized root element <{}>",
                                other
                            ))
                        }
                    };
                }

                stack.push(name);
                field = match (root, stack.len(), stack.last().map(String::as_str)) {
                    (Some(_), 3, Some("loc")) => Some(Field::Loc),
                    (Some(RootKind::UrlSet), 3, Some("lastmod")) => Some(Field::Lastmod),
                    _ => None,
                };
                if field.is_some() {
                    text.clear();
                }
                if stack.len() == 2 {
                    loc = None;
                    lastmod = None;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if stack.is_empty() {
                    let name = local_name(e.local_name().as_ref());
                    return DecodedDocument::malformed(format!("empty root element <{}/>", name));
                }
            }
            Ok(Event::Text(ref e)) => {
                if field.is_some() {
                    match e.unescape() {
                        Ok(value) => text.push_str(&value),
                        Err(err) => {
                            return DecodedDocument::malformed(format!(
                                "invalid text at byte {}: {}",
                                reader.buffer_position(),
                                err
                            ))
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(_)) => {
                let depth = stack.len();
                let closing = stack.pop();

                if let Some(current) = field.take() {
                    let value = text.trim().to_string();
                    if !value.is_empty() {
                        match current {
                            Field::Loc => loc = Some(value),
                            Field::Lastmod => lastmod = Some(value),
                        }
                    }
                } else if depth == 2 {
                    match (root, closing.as_deref()) {
                        (Some(RootKind::Index), Some("sitemap")) => {
                            if let Some(child) = loc.take() {
                                children.push(child);
                            }
                        }
                        (Some(RootKind::UrlSet), Some("url")) => {
                            if let Some(page) = loc.take() {
                                entries.push(SitemapEntry {
                                    loc: page,
                                    lastmod: lastmod.take(),
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return DecodedDocument::malformed(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return DecodedDocument::malformed(format!(
            "truncated document: <{}> was never closed",
            stack.join("/")
        ));
    }

    match root {
        None => DecodedDocument::malformed("no root element"),
        Some(RootKind::Index) if children.is_empty() => {
            DecodedDocument::malformed("sitemap index lists no sitemaps")
        }
        Some(RootKind::UrlSet) if entries.is_empty() => {
            DecodedDocument::malformed("url set lists no URLs")
        }
        Some(RootKind::Index) => DecodedDocument::Index { children },
        Some(RootKind::UrlSet) => DecodedDocument::UrlSet { entries },
    }
}
