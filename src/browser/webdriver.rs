use crate::browser::PageLoader;
use crate::config::RunConfiguration;
use crate::error::{NavigationError, SessionError};
use crate::results::{LogRecord, Severity};
use async_trait::async_trait;
use fantoccini::wd::{Capabilities, TimeoutConfiguration, WebDriverCompatibleCommand};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Extra time on top of the WebDriver timeouts before a capture is abandoned
const CAPTURE_GRACE: Duration = Duration::from_secs(15);

const FALLBACK_WEBDRIVER_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

const WAIT_FOR_LOAD_SCRIPT: &str = r#"
const done = arguments[arguments.length - 1];
if (document.readyState === 'complete') {
    done(true);
} else {
    window.addEventListener('load', () => done(true));
}
"#;

/// Chrome's legacy log endpoint, the only WebDriver route that exposes console output
#[derive(Debug, Clone)]
struct GetBrowserLog;

impl WebDriverCompatibleCommand for GetBrowserLog {
    fn endpoint(&self, base_url: &Url, session_id: Option<&str>) -> Result<Url, url::ParseError> {
        base_url.join(&format!("session/{}/se/log", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &Url) -> (http::Method, Option<String>) {
        (http::Method::POST, Some(json!({ "type": "browser" }).to_string()))
    }
}

/// Builds the capabilities for a headless Chrome session that records console output
pub fn build_capabilities(config: &RunConfiguration, threshold: Severity) -> Capabilities {
    let mut args = Vec::new();
    if config.headless {
        args.push("--headless".to_string());
    }
    if config.disable_gpu {
        args.push("--disable-gpu".to_string());
    }
    if config.no_sandbox {
        args.push("--no-sandbox".to_string());
    }
    if config.disable_dev_shm_usage {
        args.push("--disable-dev-shm-usage".to_string());
    }
    args.push(format!("--window-size={}", config.window_size));
    args.push(format!("--log-level={}", config.driver_log_level));
    args.push(format!("--user-agent={}", config.browser_user_agent));

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "excludeSwitches": ["enable-logging"],
        }),
    );
    caps.insert(
        "goog:loggingPrefs".to_string(),
        json!({ "browser": threshold.as_str() }),
    );
    caps
}

/// Connects to the WebDriver instance, trying common local endpoints if the configured one fails
async fn connect_to_webdriver(webdriver_url: &str, capabilities: &Capabilities) -> Option<Client> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities.clone());

    match builder.connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

/// Maps a WebDriver failure onto the navigation error taxonomy
fn classify_error(context: &str, error: impl std::fmt::Display) -> NavigationError {
    let text = format!("{} {}", context, error);
    let lowered = text.to_lowercase();

    if lowered.contains("invalid session id")
        || lowered.contains("unable to find session")
        || lowered.contains("session deleted")
        || lowered.contains("chrome not reachable")
        || lowered.contains("connection lost")
    {
        NavigationError::SessionLost(text)
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        NavigationError::Timeout(text)
    } else {
        NavigationError::Engine(text)
    }
}

/// Undo the escaping Chrome applies to console messages
fn clean_message(message: &str) -> String {
    message.replace("\\n", "\n").replace("\\u003C", "<")
}

/// Converts the raw log endpoint payload into records for `url`
pub fn parse_log_entries(payload: &Value, url: &str) -> Vec<LogRecord> {
    let entries: &[Value] = match payload {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get("value") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    entries
        .iter()
        .map(|entry| {
            let level = entry.get("level").and_then(Value::as_str).unwrap_or("INFO");
            let message = entry
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("No message content.");
            LogRecord::new(Severity::from_engine_level(level), clean_message(message), url)
        })
        .collect()
}

/// One WebDriver-controlled browser reused across every page of a run
pub struct BrowserSession {
    client: Option<Client>,
    webdriver_url: String,
    capabilities: Capabilities,
    page_load_timeout: Duration,
    script_timeout: Duration,
    capture_grace: Duration,
}

impl BrowserSession {
    /// Start the browser session described by `config`
    pub async fn connect(config: &RunConfiguration) -> Result<Self, SessionError> {
        let threshold = config
            .severity_threshold()
            .map_err(|e| SessionError::Setup(e.to_string()))?;

        let mut session = Self {
            client: None,
            webdriver_url: config.webdriver_url.clone(),
            capabilities: build_capabilities(config, threshold),
            page_load_timeout: config.page_load_timeout(),
            script_timeout: config.script_timeout(),
            capture_grace: CAPTURE_GRACE,
        };

        ::log::info!("Setting up WebDriver session...");
        session.ensure_client().await?;
        ::log::info!("WebDriver setup complete.");
        Ok(session)
    }

    /// Connects lazily, so a session dropped after a crash is replaced on the next page
    async fn ensure_client(&mut self) -> Result<&Client, SessionError> {
        if self.client.is_none() {
            let client = connect_to_webdriver(&self.webdriver_url, &self.capabilities)
                .await
                .ok_or_else(|| SessionError::Connect {
                    tried: self.webdriver_url.clone(),
                })?;

            let timeouts = TimeoutConfiguration::new(
                Some(self.script_timeout),
                Some(self.page_load_timeout),
                None,
            );
            if let Err(e) = client.update_timeouts(timeouts).await {
                // The session exists on the server even though setup failed
                if let Err(close_error) = client.close().await {
                    ::log::debug!("Failed to close half-configured session: {}", close_error);
                }
                return Err(SessionError::Setup(e.to_string()));
            }

            self.client = Some(client);
        }

        self.client
            .as_ref()
            .ok_or_else(|| SessionError::Setup("client unavailable".to_string()))
    }

    /// Drop the current client so the next capture reconnects
    async fn discard_client(&mut self) {
        ::log::warn!("Discarding lost WebDriver session; reconnecting before the next page");
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close().await {
                ::log::debug!("Failed to close lost session: {}", e);
            }
        }
    }

    async fn navigate(client: &Client, url: &str) -> Result<Vec<LogRecord>, NavigationError> {
        // Records left over from the previous page belong to that page
        if let Err(e) = client.issue_cmd(GetBrowserLog).await {
            ::log::debug!("Failed to drain stale console records: {}", e);
        }

        client
            .goto(url)
            .await
            .map_err(|e| classify_error("navigating to", e))?;

        client
            .execute_async(WAIT_FOR_LOAD_SCRIPT, Vec::new())
            .await
            .map_err(|e| classify_error("waiting for scripts on", e))?;

        let payload = client
            .issue_cmd(GetBrowserLog)
            .await
            .map_err(|e| classify_error("retrieving console records for", e))?;

        Ok(parse_log_entries(&payload, url))
    }
}

#[async_trait]
impl PageLoader for BrowserSession {
    async fn capture(&mut self, url: &str) -> Result<Vec<LogRecord>, NavigationError> {
        let limit = self.page_load_timeout + self.script_timeout + self.capture_grace;

        let client = match self.ensure_client().await {
            Ok(client) => client.clone(),
            Err(e) => return Err(NavigationError::SessionLost(e.to_string())),
        };

        let (result, stalled) = match timeout(limit, Self::navigate(&client, url)).await {
            Ok(result) => (result, false),
            // The browser may still be busy with the abandoned page
            Err(_) => (
                Err(NavigationError::Timeout(format!(
                    "no response from the browser within {}ms",
                    limit.as_millis()
                ))),
                true,
            ),
        };

        let lost = matches!(&result, Err(e) if e.requires_reconnect());
        if stalled || lost {
            self.discard_client().await;
        }
        result
    }

    async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            ::log::info!("Closing WebDriver...");
            match client.close().await {
                Ok(()) => ::log::info!("WebDriver closed."),
                Err(e) => ::log::warn!("Failed to close WebDriver session: {}", e),
            }
        }
    }
}
