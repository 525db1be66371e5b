use std::time::{Duration, Instant};

use reqwest::Url;
use reqwest::blocking::Client;

use crate::domain::{GenerationError, ProviderKind};

use super::response_parsing::map_http_error;
use super::{OutboundRequest, RequestAuth};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one JSON POST per call. Holds no per-request state, so a single
/// transport can serve any number of independent generations.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn with_timeout(timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            GenerationError::internal(format!("failed to create HTTP client: {err}"))
        })?;
        Ok(Self { client })
    }

    /// Returns the raw success body; non-2xx statuses become `ProviderHttp`.
    pub fn send(
        &self,
        provider: ProviderKind,
        request: &OutboundRequest,
    ) -> Result<String, GenerationError> {
        let mut url = Url::parse(&request.url).map_err(|err| {
            GenerationError::configuration(format!(
                "{} endpoint URL '{}' is invalid: {err}",
                provider.display_name(),
                request.url
            ))
        })?;

        if let RequestAuth::QueryParam { name, value } = &request.auth {
            url.query_pairs_mut().append_pair(name, value);
        }

        tracing::debug!(
            provider = %provider,
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            "dispatching diagram generation request"
        );

        let mut builder = self
            .client
            .post(url)
            .header("content-type", "application/json");
        builder = match &request.auth {
            RequestAuth::Bearer(token) => builder.bearer_auth(token),
            RequestAuth::Header { name, value } => builder.header(*name, value),
            RequestAuth::QueryParam { .. } => builder,
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let started = Instant::now();
        let response = builder
            .json(&request.body)
            .send()
            .map_err(|err| map_transport_error(provider, err))?;

        let status = response.status();
        let response_body = response
            .text()
            .map_err(|err| map_transport_error(provider, err))?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !status.is_success() {
            let error = map_http_error(provider, status, &response_body);
            tracing::warn!(
                provider = %provider,
                status = status.as_u16(),
                latency_ms,
                "provider rejected request"
            );
            return Err(error);
        }

        tracing::debug!(
            provider = %provider,
            status = status.as_u16(),
            latency_ms,
            "provider responded"
        );
        Ok(response_body)
    }
}

fn map_transport_error(provider: ProviderKind, error: reqwest::Error) -> GenerationError {
    // reqwest's Display includes the URL, which carries the Gemini key.
    let error = error.without_url();
    if error.is_timeout() {
        return GenerationError::network(format!(
            "{} request timed out",
            provider.display_name()
        ));
    }
    GenerationError::network(format!(
        "{} transport error: {error}",
        provider.display_name()
    ))
}
