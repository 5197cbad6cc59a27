use crate::error::SitemapParseError;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// A parsed sitemap body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Lists other sitemap documents
    Index { sitemaps: Vec<String> },
    /// Lists page URLs directly
    UrlSet { pages: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Index,
    UrlSet,
}

impl RootKind {
    fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "sitemapindex" => Some(RootKind::Index),
            "urlset" => Some(RootKind::UrlSet),
            _ => None,
        }
    }

    /// Element that wraps each `<loc>` under this root
    fn entry(&self) -> &'static str {
        match self {
            RootKind::Index => "sitemap",
            RootKind::UrlSet => "url",
        }
    }

    fn into_document(self, locs: Vec<String>) -> SitemapDocument {
        match self {
            RootKind::Index => {
                ::log::debug!("Sitemap parser found {} child sitemaps", locs.len());
                SitemapDocument::Index { sitemaps: locs }
            }
            RootKind::UrlSet => {
                ::log::debug!("Sitemap parser found {} page URLs", locs.len());
                SitemapDocument::UrlSet { pages: locs }
            }
        }
    }
}

/// Namespace an element resolved to; unbound elements are `None`
fn namespace_key(ns: &ResolveResult<'_>) -> Option<Vec<u8>> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(uri.to_vec()),
        ResolveResult::Unknown(prefix) => Some(prefix.clone()),
        ResolveResult::Unbound => None,
    }
}

/// Parses a sitemap body.
///
/// The root is recognised by local name (`sitemapindex` or `urlset`) in any
/// namespace. Only `<loc>` elements in the root's namespace whose parent is an
/// entry element in that namespace are collected, so extension elements such
/// as `image:loc` are ignored. Malformed markup after the root has started ends
/// the document early and keeps what was read so far.
pub fn parse_sitemap(content: &str) -> Result<SitemapDocument, SitemapParseError> {
    let mut reader = NsReader::from_str(content);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut root: Option<(RootKind, Option<Vec<u8>>)> = None;
    // (local name, in root namespace) for every open element inside the root
    let mut open: Vec<(String, bool)> = Vec::new();
    let mut current_loc: Option<String> = None;
    let mut locs = Vec::new();

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok(resolved) => resolved,
            Err(e) => {
                if root.is_some() {
                    ::log::debug!("Stopped reading malformed sitemap early: {}", e);
                    break;
                }
                return Err(SitemapParseError::UnrecognizedRoot);
            }
        };
        let ns = namespace_key(&ns);

        match event {
            Event::Start(e) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if root.is_none() {
                    if let Some(kind) = RootKind::from_local_name(&local) {
                        root = Some((kind, ns));
                        open.push((local, true));
                    }
                    continue;
                }
                let Some((kind, root_ns)) = &root else {
                    continue;
                };

                let in_root_ns = ns == *root_ns;
                let parent_is_entry = open
                    .last()
                    .is_some_and(|(name, same)| *same && name == kind.entry());
                if in_root_ns && local == "loc" && parent_is_entry {
                    current_loc = Some(String::new());
                }
                open.push((local, in_root_ns));
            }
            Event::Empty(e) => {
                if root.is_none() {
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if let Some(kind) = RootKind::from_local_name(&local) {
                        return Ok(kind.into_document(Vec::new()));
                    }
                }
            }
            Event::Text(t) => {
                if let Some(loc) = current_loc.as_mut() {
                    match t.unescape() {
                        Ok(text) => loc.push_str(&text),
                        Err(_) => loc.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(c) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if root.is_none() {
                    continue;
                }
                open.pop();
                if let Some(loc) = current_loc.take() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
                if open.is_empty() {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root {
        Some((kind, _)) => Ok(kind.into_document(locs)),
        None => Err(SitemapParseError::UnrecognizedRoot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(list: &[&str]) -> SitemapDocument {
        SitemapDocument::UrlSet {
            pages: list.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-07-01</lastmod>
  </url>
  <url>
    <loc> https://example.com/about/ </loc>
    <image:image><image:loc>https://example.com/logo.png</image:loc></image:image>
  </url>
  <url><loc>https://example.com/search?q=a&amp;b=c</loc></url>
</urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc,
            pages(&[
                "https://example.com/",
                "https://example.com/about/",
                "https://example.com/search?q=a&b=c",
            ])
        );
    }

    #[test]
    fn test_parse_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/post-sitemap.xml</loc></sitemap>
  <sitemap><loc>https://example.com/page-sitemap.xml</loc><lastmod>2024-07-01</lastmod></sitemap>
</sitemapindex>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Index {
                sitemaps: vec![
                    "https://example.com/post-sitemap.xml".to_string(),
                    "https://example.com/page-sitemap.xml".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_self_closing_siblings_before_loc() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:xhtml="http://www.w3.org/1999/xhtml"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url><xhtml:link rel="alternate" hreflang="de" href="https://example.com/de/a"/><loc>https://example.com/a</loc></url>
  <url><image:image/><loc>https://example.com/b</loc></url>
  <url><loc>https://example.com/c</loc></url>
</urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc,
            pages(&[
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ])
        );
    }

    #[test]
    fn test_cdata_locations() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc><![CDATA[https://example.com/a?x=1&y=2]]></loc></url>
  <url><loc>https://example.com/b</loc></url>
</urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc,
            pages(&["https://example.com/a?x=1&y=2", "https://example.com/b"])
        );
    }

    #[test]
    fn test_namespace_prefixed_elements() {
        let xml = r#"<s:urlset xmlns:s="http://www.sitemaps.org/schemas/sitemap/0.9">
  <s:url><s:loc>https://example.com/a</s:loc></s:url>
</s:urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(doc, pages(&["https://example.com/a"]));
    }

    #[test]
    fn test_recovers_from_unclosed_tags() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url><url><loc>https://example.com/b</loc>";
        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(doc, pages(&["https://example.com/a", "https://example.com/b"]));
    }

    #[test]
    fn test_unrecognized_documents() {
        assert!(parse_sitemap("<html><body><h1>Not Found</h1></body></html>").is_err());
        assert!(parse_sitemap("just some text").is_err());
        assert!(parse_sitemap("").is_err());
    }

    #[test]
    fn test_empty_urlset() {
        assert_eq!(parse_sitemap("<urlset></urlset>").unwrap(), pages(&[]));
        assert_eq!(parse_sitemap("<urlset/>").unwrap(), pages(&[]));
    }
}
