use crate::{
    error::ClientError,
    http::config::{Auth, HttpClientConfig, TlsConfig},
    remote::{RemoteReader, RemoteWriter},
};
use async_trait::async_trait;
use model::{
    core::{matcher::Matcher, time_range::TimeRange},
    records::series::SeriesSet,
};
use reqwest::{Certificate, Client, Identity, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

#[derive(Debug, Clone)]
enum Credentials {
    None,
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer(String),
}

#[derive(Serialize)]
struct ReadRequest<'a> {
    start_ms: i64,
    end_ms: i64,
    matchers: &'a [Matcher],
}

#[derive(Deserialize)]
struct ReadResponse {
    series: SeriesSet,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    series: &'a SeriesSet,
}

/// Remote-read / remote-write client over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    url: String,
    client: Client,
    credentials: Credentials,
}

impl HttpRemoteClient {
    pub fn new(url: impl Into<String>, config: &HttpClientConfig) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let mut builder = Client::builder().timeout(config.timeout);
        builder = apply_tls(builder, &config.tls)?;

        Ok(Self {
            url: url.into(),
            client: builder.build()?,
            credentials: resolve_credentials(&config.auth)?,
        })
    }

    fn post(&self) -> RequestBuilder {
        let request = self.client.post(&self.url);
        match &self.credentials {
            Credentials::None => request,
            Credentials::Basic { username, password } => {
                request.basic_auth(username, password.as_ref())
            }
            Credentials::Bearer(token) => request.bearer_auth(token),
        }
    }
}

#[async_trait]
impl RemoteReader for HttpRemoteClient {
    async fn read_range(
        &self,
        range: TimeRange,
        selector: &[Matcher],
    ) -> Result<SeriesSet, ClientError> {
        debug!(url = %self.url, range = %range, "Reading range");

        let response = self
            .post()
            .json(&ReadRequest {
                start_ms: range.start,
                end_ms: range.end,
                matchers: selector,
            })
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut body: ReadResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        // Stores may treat the end bound as inclusive.
        body.series.retain_range(&range);
        Ok(body.series)
    }
}

#[async_trait]
impl RemoteWriter for HttpRemoteClient {
    async fn write_batch(&self, payload: &SeriesSet) -> Result<(), ClientError> {
        debug!(
            url = %self.url,
            series = payload.len(),
            samples = payload.sample_count(),
            "Writing batch"
        );

        let response = self
            .post()
            .json(&WriteRequest { series: payload })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

fn apply_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsConfig,
) -> Result<reqwest::ClientBuilder, ClientError> {
    if let Some(ca_file) = &tls.ca_file {
        let pem = read_bytes(ca_file)?;
        let cert = Certificate::from_pem(&pem).map_err(|e| ClientError::Build(e.to_string()))?;
        builder = builder.add_root_certificate(cert);
    }

    if let (Some(cert_file), Some(key_file)) = (&tls.cert_file, &tls.key_file) {
        let cert = read_bytes(cert_file)?;
        let key = read_bytes(key_file)?;
        let identity =
            Identity::from_pkcs8_pem(&cert, &key).map_err(|e| ClientError::Build(e.to_string()))?;
        builder = builder.identity(identity);
    }

    if tls.insecure_skip_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

fn resolve_credentials(auth: &Auth) -> Result<Credentials, ClientError> {
    if let Some(token) = &auth.bearer_token {
        return Ok(Credentials::Bearer(token.clone()));
    }
    if let Some(path) = &auth.bearer_token_file {
        return Ok(Credentials::Bearer(read_secret(path)?));
    }

    let Some(username) = &auth.username else {
        return Ok(Credentials::None);
    };
    let password = match (&auth.password, &auth.password_file) {
        (Some(password), _) => Some(password.clone()),
        (None, Some(path)) => Some(read_secret(path)?),
        (None, None) => None,
    };

    Ok(Credentials::Basic {
        username: username.clone(),
        password,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ClientError> {
    fs::read(path).map_err(|e| ClientError::Build(format!("reading {}: {e}", path.display())))
}

fn read_secret(path: &Path) -> Result<String, ClientError> {
    let bytes = read_bytes(path)?;
    let secret = String::from_utf8(bytes)
        .map_err(|e| ClientError::Build(format!("reading {}: {e}", path.display())))?;
    Ok(secret.trim().to_string())
}
