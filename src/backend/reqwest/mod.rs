//! Reqwest transport

use crate::backend::types::{BackendRequest, BackendResponse, ProgressCallback};
use crate::backend::{BackendConfig, ProxyConfig};
use crate::body::Body;
use crate::{Error, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;

/// Upload bodies are fed to reqwest in chunks of this size so progress can be reported.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Reqwest-based transport
#[derive(Clone, Debug)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new Reqwest backend
    pub fn new() -> Result<Self> {
        Self::with_config(BackendConfig::default())
    }

    /// Create a new Reqwest backend with configuration
    pub fn with_config(config: BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if let Some(default_headers) = config.default_headers {
            builder = builder.default_headers(default_headers);
        }

        if config.use_cookies == Some(true) {
            builder = builder.cookie_store(true);
        }

        if let Some(http_proxy) = config.http_proxy {
            let proxy = reqwest::Proxy::http(proxy_url("http", &http_proxy))
                .map_err(|e| Error::Internal(format!("Invalid HTTP proxy: {}", e)))?;
            builder = builder.proxy(with_proxy_auth(proxy, &http_proxy));
        }

        if let Some(https_proxy) = config.https_proxy {
            let proxy = reqwest::Proxy::https(proxy_url("https", &https_proxy))
                .map_err(|e| Error::Internal(format!("Invalid HTTPS proxy: {}", e)))?;
            builder = builder.proxy(with_proxy_auth(proxy, &https_proxy));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create reqwest client: {}", e)))?;

        Ok(Self { client })
    }

    /// Execute an HTTP request using reqwest.
    ///
    /// Resolves once the status line and headers arrive; the body is streamed
    /// through [`BackendResponse::body_receiver`].
    pub async fn execute(&self, request: BackendRequest) -> Result<BackendResponse> {
        let mut req_builder = self.client.request(request.method, request.url);

        req_builder = req_builder.headers(request.headers);

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            match body {
                Body::Multipart { parts } => {
                    let mut form = reqwest::multipart::Form::new();
                    for part in parts {
                        let mut part_builder =
                            reqwest::multipart::Part::bytes(part.content.to_vec());

                        if let Some(filename) = part.filename {
                            part_builder = part_builder.file_name(filename);
                        }

                        if let Some(content_type) = &part.content_type {
                            part_builder = part_builder.mime_str(content_type).map_err(|e| {
                                Error::Encoding(format!("Invalid content type: {}", e))
                            })?;
                        }

                        form = form.part(part.name, part_builder);
                    }
                    req_builder = req_builder.multipart(form);
                }
                other => {
                    let content = other.to_bytes()?.unwrap_or_default();
                    req_builder = req_builder.body(convert_body(content, request.progress_callback));
                }
            }
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| Error::from_reqwest(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let content_length = response.content_length();

        // Create channel for streaming body
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        if tx.send(Ok(bytes)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(Error::from_reqwest(&e))).await;
                        break;
                    }
                }
            }
        });

        Ok(BackendResponse {
            status,
            headers,
            url,
            content_length,
            body_receiver: rx,
        })
    }

    /// Get the underlying reqwest client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

fn proxy_url(scheme: &str, proxy: &ProxyConfig) -> String {
    format!("{}://{}:{}", scheme, proxy.host, proxy.port)
}

fn with_proxy_auth(proxy: reqwest::Proxy, config: &ProxyConfig) -> reqwest::Proxy {
    match (&config.username, &config.password) {
        (Some(username), Some(password)) => proxy.basic_auth(username, password),
        _ => proxy,
    }
}

fn convert_body(content: Bytes, progress: Option<ProgressCallback>) -> reqwest::Body {
    match progress {
        Some(progress) => reqwest::Body::wrap_stream(progress_stream(content, progress)),
        None => reqwest::Body::from(content),
    }
}

fn progress_stream(
    content: Bytes,
    progress: ProgressCallback,
) -> impl futures_util::Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let total = content.len() as u64;
    let mut sent = 0u64;
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| content.slice(start..(start + UPLOAD_CHUNK_SIZE).min(content.len())))
        .collect();

    progress(0, Some(total));
    futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress(sent, Some(total));
        Ok::<_, std::io::Error>(chunk)
    })
}
