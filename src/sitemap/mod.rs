pub mod fetcher;
pub mod parser;

#[cfg(test)]
mod tests;

pub use fetcher::{HttpFetcher, SitemapFetcher};
pub use parser::{SitemapDocument, parse_sitemap};

use crate::error::ResolutionError;
use std::collections::HashSet;
use url::Url;

/// Flattened, deduplicated page URLs in first-discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedUrlSet {
    urls: Vec<Url>,
}

impl ResolvedUrlSet {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Url> {
        self.urls.iter()
    }
}

impl FromIterator<Url> for ResolvedUrlSet {
    /// Keeps the first occurrence of every URL
    fn from_iter<I: IntoIterator<Item = Url>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let urls = iter
            .into_iter()
            .filter(|url| seen.insert(url.as_str().to_owned()))
            .collect();
        Self { urls }
    }
}

impl<'a> IntoIterator for &'a ResolvedUrlSet {
    type Item = &'a Url;
    type IntoIter = std::slice::Iter<'a, Url>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}

/// Expands a root sitemap into every leaf page URL it reaches
pub struct SitemapResolver<F: SitemapFetcher> {
    fetcher: F,
}

impl<F: SitemapFetcher> SitemapResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Resolve `root` depth-first over index documents.
    ///
    /// A failure on the root document is returned; failures on child
    /// sitemaps are logged and skipped. Every sitemap URL is fetched at most
    /// once, so self-referencing or cyclic indexes terminate.
    pub async fn resolve(&self, root: &str) -> Result<ResolvedUrlSet, ResolutionError> {
        let root_url = Url::parse(root.trim()).map_err(|source| ResolutionError::InvalidUrl {
            url: root.to_string(),
            source,
        })?;

        let root_doc = self.load(&root_url).await?;

        let mut visited: HashSet<String> = HashSet::from([root_url.as_str().to_owned()]);
        let mut pending: Vec<Url> = Vec::new();
        let mut discovered: Vec<Url> = Vec::new();
        expand(&root_url, root_doc, &mut pending, &mut discovered);

        while let Some(sitemap_url) = pending.pop() {
            if !visited.insert(sitemap_url.as_str().to_owned()) {
                ::log::warn!("Sitemap already visited, skipping: {}", sitemap_url);
                continue;
            }

            match self.load(&sitemap_url).await {
                Ok(doc) => expand(&sitemap_url, doc, &mut pending, &mut discovered),
                Err(e) => ::log::error!("Skipping child sitemap: {}", e),
            }
        }

        let resolved: ResolvedUrlSet = discovered.into_iter().collect();
        ::log::info!(
            "Found {} unique page URLs across {} sitemap(s)",
            resolved.len(),
            visited.len()
        );
        Ok(resolved)
    }

    /// Fetch and parse a single sitemap document
    async fn load(&self, url: &Url) -> Result<SitemapDocument, ResolutionError> {
        let content = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| ResolutionError::Fetch {
                url: url.to_string(),
                source,
            })?;

        if content.trim().is_empty() {
            return Err(ResolutionError::EmptyDocument {
                url: url.to_string(),
            });
        }

        let doc = parse_sitemap(&content).map_err(|source| ResolutionError::Parse {
            url: url.to_string(),
            source,
        })?;

        match &doc {
            SitemapDocument::Index { .. } => ::log::info!("Detected sitemap index: {}", url),
            SitemapDocument::UrlSet { .. } => ::log::info!("Detected URL set: {}", url),
        }
        Ok(doc)
    }
}

/// Queue children of an index, or collect pages of a URL set
fn expand(base: &Url, doc: SitemapDocument, pending: &mut Vec<Url>, discovered: &mut Vec<Url>) {
    match doc {
        SitemapDocument::Index { sitemaps } => {
            let children: Vec<Url> = sitemaps
                .iter()
                .filter_map(|loc| match base.join(loc) {
                    Ok(child) => Some(child),
                    Err(e) => {
                        ::log::warn!("Skipping invalid child sitemap '{}' in {}: {}", loc, base, e);
                        None
                    }
                })
                .collect();
            // Stack order: the first listed child is expanded first
            pending.extend(children.into_iter().rev());
        }
        SitemapDocument::UrlSet { pages } => {
            for loc in pages {
                match Url::parse(&loc) {
                    Ok(page) if matches!(page.scheme(), "http" | "https") => discovered.push(page),
                    _ => ::log::warn!("Skipping invalid/relative URL found in {}: {}", base, loc),
                }
            }
        }
    }
}
