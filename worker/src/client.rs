use std::time::Duration;

use anyhow::{Context, Result};
use common::{
    AskTaskRequest, AskTaskResponse, Assignment, CompleteTaskRequest, CompleteTaskResponse,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::sleep;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallas que vale la pena reintentar: el coordinador no respondió o
/// respondió 5xx. Todo lo demás (4xx, respuesta que no parsea) es permanente.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect()
        || e.is_timeout()
        || e.status().map(|s| s.is_server_error()).unwrap_or(false)
}

/// Cliente HTTP de las dos llamadas del protocolo.
#[derive(Clone)]
pub struct CoordinatorClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    backoff: Duration,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>, max_retries: u32, backoff: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("no se pudo crear el cliente HTTP")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries,
            backoff,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ask_task(&self) -> Result<Assignment> {
        let resp: AskTaskResponse = self
            .post("/api/v1/tasks/ask", &AskTaskRequest::default())
            .await?;
        Ok(resp.task)
    }

    /// Devuelve si el coordinador aceptó el reporte.
    pub async fn complete_task(&self, req: &CompleteTaskRequest) -> Result<bool> {
        let resp: CompleteTaskResponse = self.post("/api/v1/tasks/complete", req).await?;
        Ok(resp.accepted)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            match self.try_post(&url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "llamada a {} falló ({}), reintento {}/{}",
                        url, e, attempt, self.max_retries
                    );
                    sleep(self.backoff * attempt).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("llamada a {} falló", url));
                }
            }
        }
    }

    async fn try_post<Req, Resp>(&self, url: &str, body: &Req) -> reqwest::Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        self.http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
