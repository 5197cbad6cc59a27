use crate::config::RunConfiguration;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// Retrieves the raw text of a sitemap document
#[async_trait]
pub trait SitemapFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds the HTTP client used for sitemap requests
pub fn build_http_client(config: &RunConfiguration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.sitemap_user_agent.as_str())
        .timeout(config.sitemap_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches sitemaps over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &RunConfiguration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl SitemapFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        ::log::info!("Fetching sitemap: {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
