
use crate::error::FetchError;
use crate::sitemap::SitemapFetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Serves sitemap bodies from memory and records every request
#[derive(Default)]
pub(crate) struct StaticFetcher {
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub(crate) fn with(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SitemapFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.documents
            .get(url.as_str())
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

pub(crate) fn urlset(pages: &[&str]) -> String {
    let entries: String = pages
        .iter()
        .map(|p| format!("<url><loc>{}</loc></url>", p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

pub(crate) fn index(sitemaps: &[&str]) -> String {
    let entries: String = sitemaps
        .iter()
        .map(|s| format!("<sitemap><loc>{}</loc></sitemap>", s))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}
