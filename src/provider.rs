//! HTTP client for the schedule provider backend.

use std::time::Duration;

use anyhow::{Context, Result};
use orario_core::Schedule;
use serde_json::Value;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ProviderClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ProviderClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL '{base_url}'"))?;

        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend URL '{base_url}' cannot hold a path");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!(%url, "GET");

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("{url} answered {status}");
        }

        resp.text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))
    }

    /// GET /query/:teaching
    pub async fn lessons(&self, teaching: &str) -> Result<Schedule> {
        let body = self.get_text(self.endpoint(&["query", teaching])).await?;

        Schedule::from_payload(teaching, &body)
            .with_context(|| format!("Unexpected lesson payload for '{teaching}'"))
    }

    /// GET /query/:location/:degree_type/:cycle
    pub async fn teachings(
        &self,
        location: &str,
        degree_type: &str,
        cycle: &str,
    ) -> Result<Vec<String>> {
        let url = self.endpoint(&["query", location, degree_type, cycle]);
        let body = self.get_text(url).await?;

        decode_teachings(&body)
    }

    /// GET /csv_creation_date
    pub async fn dataset_date(&self) -> Result<String> {
        let body = self.get_text(self.endpoint(&["csv_creation_date"])).await?;

        Ok(match serde_json::from_str::<Value>(&body) {
            Ok(Value::String(date)) => date,
            _ => body.trim().to_string(),
        })
    }
}

/// Teaching names out of the filter endpoint's answer: a JSON object keyed by
/// name, usually wrapped once more in a JSON string.
fn decode_teachings(body: &str) -> Result<Vec<String>> {
    let value = match serde_json::from_str::<Value>(body).context("Teachings are not JSON")? {
        Value::String(inner) => {
            serde_json::from_str::<Value>(&inner).context("Teachings are not JSON")?
        }
        other => other,
    };

    let mut teachings: Vec<String> = match value {
        Value::Object(map) => map.into_iter().map(|(name, _)| name).collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => anyhow::bail!("Teachings payload is neither an object nor a list"),
    };

    teachings.retain(|name| !name.is_empty() && name != "null");
    teachings.sort();
    teachings.dedup();
    Ok(teachings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ProviderClient {
        ProviderClient::new(base).unwrap()
    }

    #[test]
    fn builds_lesson_endpoint_with_encoded_teaching() {
        let url = client("http://localhost:8081").endpoint(&["query", "ALGORITHMS, ADVANCED/2"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:8081/query/ALGORITHMS,%20ADVANCED%2F2"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let url = client("https://uni.example.org/orario/").endpoint(&["csv_creation_date"]);
        assert_eq!(url.as_str(), "https://uni.example.org/orario/csv_creation_date");
    }

    #[test]
    fn builds_filter_endpoint() {
        let url = client("http://localhost:8081").endpoint(&["query", "Venezia", "Laurea", "1"]);
        assert_eq!(url.as_str(), "http://localhost:8081/query/Venezia/Laurea/1");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(ProviderClient::new("not a url").is_err());
        assert!(ProviderClient::new("mailto:someone@example.org").is_err());
    }

    #[test]
    fn decodes_string_wrapped_teachings() {
        let body = r#""{\"STATISTICS\": \"STATISTICS\", \"ALGORITHMS\": \"ALGORITHMS\", \"null\": \"null\"}""#;
        assert_eq!(
            decode_teachings(body).unwrap(),
            vec!["ALGORITHMS".to_string(), "STATISTICS".to_string()]
        );
    }

    #[test]
    fn decodes_plain_teaching_list() {
        let body = r#"["B", "A", "B"]"#;
        assert_eq!(decode_teachings(body).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn rejects_scalar_teachings_payload() {
        assert!(decode_teachings("42").is_err());
        assert!(decode_teachings("<html>").is_err());
    }
}
