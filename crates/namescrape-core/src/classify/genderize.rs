use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ClassifyError, ClassifyResult, Gender, GenderClassifier};

pub const GENDERIZE_ENDPOINT: &str = "https://api.genderize.io/";

/// The service accepts at most ten names per request.
pub const GENDERIZE_BATCH_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct GenderizeEntry {
    name: String,
    gender: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenderizeResponse {
    Many(Vec<GenderizeEntry>),
    One(GenderizeEntry),
}

/// [`GenderClassifier`] backed by the genderize.io HTTP API.
pub struct GenderizeClassifier {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GenderizeClassifier {
    pub fn new() -> ClassifyResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(GENDERIZE_ENDPOINT)?,
            api_key: None,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> ClassifyResult<Self> {
        self.endpoint = Url::parse(endpoint)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// `name[0]=..&name[1]=..` for one batch.
    pub fn batch_url(&self, names: &[String]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (i, name) in names.iter().enumerate() {
                query.append_pair(&format!("name[{i}]"), name);
            }
            if let Some(ref key) = self.api_key {
                query.append_pair("apikey", key);
            }
        }
        url
    }

    pub fn parse_response(body: &str) -> ClassifyResult<Vec<Gender>> {
        let entries = match serde_json::from_str::<GenderizeResponse>(body)? {
            GenderizeResponse::Many(entries) => entries,
            GenderizeResponse::One(entry) => vec![entry],
        };

        Ok(entries
            .iter()
            .map(|e| {
                if e.gender.is_none() {
                    debug!(name = %e.name, "no prediction for name");
                }
                Gender::from_label(e.gender.as_deref())
            })
            .collect())
    }

    async fn classify_batch(&self, names: &[String]) -> ClassifyResult<Vec<Gender>> {
        let url = self.batch_url(names);
        debug!(names = names.len(), "querying genderize");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let genders = Self::parse_response(&response.text().await?)?;
        if genders.len() != names.len() {
            return Err(ClassifyError::LengthMismatch {
                expected: names.len(),
                got: genders.len(),
            });
        }
        Ok(genders)
    }
}

#[async_trait]
impl GenderClassifier for GenderizeClassifier {
    async fn classify(&self, first_names: &[String]) -> ClassifyResult<Vec<Gender>> {
        let mut genders = Vec::with_capacity(first_names.len());
        for batch in first_names.chunks(GENDERIZE_BATCH_SIZE) {
            genders.extend(self.classify_batch(batch).await?);
        }
        Ok(genders)
    }
}
