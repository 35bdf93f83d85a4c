use dioxus::logger::tracing::{info, warn};

use super::{
  server::{AppError, GraphQlRequest, GraphQlResponse, TRANSPORTS_QUERY},
  transport::Transport
};

/// Bulk loader for the full transport collection.
///
/// Holds no state besides the client and endpoint, so `fetch` can be called
/// again at any time (manual refresh). The result replaces the collection.
#[derive(Clone)]
pub struct SnapshotFetcher {
  client: reqwest::Client,
  query_url: String
}

impl SnapshotFetcher {
  pub fn new(client: reqwest::Client, query_url: &str) -> Self {
    Self { client, query_url: query_url.to_string() }
  }

  pub async fn fetch(&self) -> Result<Vec<Transport>, AppError> {
    let resp = self.client
      .post(&self.query_url)
      .json(&GraphQlRequest { query: TRANSPORTS_QUERY })
      .send()
      .await
      .map_err(|e| AppError::FetchError(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      warn!("snapshot query failed with status {}", status.as_u16());
      return Err(AppError::FetchError(format!("HTTP error! status: {}", status.as_u16())));
    }

    let body = resp.json::<GraphQlResponse>().await.map_err(|e| AppError::FetchError(e.to_string()))?;
    let transports = body.into_transports()?;
    info!("snapshot loaded with {} transports", transports.len());
    Ok(transports)
  }
}
