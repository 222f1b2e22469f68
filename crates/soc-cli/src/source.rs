//! Where a catalog batch comes from: the live API or a saved JSON file.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use reqwest::Client;
use soc_core::{record::{CatalogCourse, parse_catalog}, term::TermKey};

pub enum Source {
  Api(ApiClient),
  File(PathBuf),
}

impl Source {
  pub async fn fetch(&self, term: &TermKey) -> Result<Vec<CatalogCourse>> {
    match self {
      Source::Api(client) => client.courses(term).await,
      Source::File(path) => {
        let raw = tokio::fs::read(path)
          .await
          .with_context(|| format!("reading {}", path.display()))?;
        parse_catalog(&raw).with_context(|| format!("decoding {}", path.display()))
      }
    }
  }
}

/// Client for the public schedule-of-classes API.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self) -> String {
    format!("{}/courses.json", self.base_url.trim_end_matches('/'))
  }

  /// `GET /courses.json?year=&term=&campus=`
  pub async fn courses(&self, term: &TermKey) -> Result<Vec<CatalogCourse>> {
    let resp = self
      .client
      .get(self.url())
      .query(&[
        ("year", term.year.to_string()),
        ("term", term.term.clone()),
        ("campus", term.campus.clone()),
      ])
      .send()
      .await
      .context("GET /courses.json failed")?
      .error_for_status()
      .with_context(|| format!("catalog request for {term} rejected"))?;

    let raw = resp.bytes().await.context("reading catalog response")?;
    parse_catalog(&raw).with_context(|| format!("decoding catalog for {term}"))
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn url_tolerates_trailing_slash() {
    let client = ApiClient::new("https://example.test/soc/api/", Duration::from_secs(1)).unwrap();
    assert_eq!(client.url(), "https://example.test/soc/api/courses.json");
  }

  #[tokio::test]
  async fn reads_a_saved_catalog() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"courseString": "01:198:111", "sections": null}}]"#).unwrap();

    let term = TermKey::new(2025, "9", "NB").unwrap();
    let courses = Source::File(file.path().to_path_buf()).fetch(&term).await.unwrap();
    assert_eq!(courses.len(), 1);
    assert!(courses[0].sections.is_empty());
  }
}
