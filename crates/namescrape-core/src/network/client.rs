use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::config::FetchConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unsupported URL scheme {scheme:?} in {url}")]
    UnsupportedScheme { scheme: String, url: String },
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document unavailable: {0}")]
    Unavailable(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Retrieves the raw markup behind a document URL.
#[async_trait]
pub trait DocumentAccessor: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<String>;
}

/// Fetches `http(s)://` over reqwest and `file://` from disk.
pub struct HttpAccessor {
    config: FetchConfig,
    inner: Client,
}

impl HttpAccessor {
    pub fn new(config: FetchConfig) -> FetchResult<Self> {
        let inner = Self::build_client(&config)?;
        Ok(Self { config, inner })
    }

    fn build_client(config: &FetchConfig) -> FetchResult<Client> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_seconds)))
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        } else {
            builder = builder.user_agent(random_user_agent());
        }

        builder.build().map_err(FetchError::Http)
    }

    fn validate_request(url: &str) -> FetchResult<Url> {
        let parsed = Url::parse(url)?;

        match parsed.scheme() {
            "http" | "https" => {
                if parsed.host_str().is_none() {
                    return Err(FetchError::InvalidUrl(format!("No host in URL: {url}")));
                }
                Ok(parsed)
            }
            "file" => Ok(parsed),
            other => Err(FetchError::UnsupportedScheme {
                scheme: other.to_string(),
                url: url.to_string(),
            }),
        }
    }

    async fn read_file(url: &Url) -> FetchResult<String> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::InvalidUrl(url.to_string()))?;
        Ok(tokio::fs::read_to_string(path).await?)
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl DocumentAccessor for HttpAccessor {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let parsed = Self::validate_request(url)?;

        if parsed.scheme() == "file" {
            return Self::read_file(&parsed).await;
        }

        let response = self.inner.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "fetched document");
        Ok(body)
    }
}

fn random_user_agent() -> String {
    use rand::Rng;

    let agents = [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
        "Mozilla/5.0 (Windows NT 10.0; rv:128.0) Gecko/20100101 Firefox/128.0",
    ];

    let mut rng = rand::rng();
    agents[rng.random_range(0..agents.len())].to_string()
}
