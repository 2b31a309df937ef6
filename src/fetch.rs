use std::io::Read;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{error, info};

use crate::error::DaedalusError;
use crate::progress;

/// A GET request: url, query parameters and extra headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

pub trait Fetcher: Send + Sync {
    /// Retrieves the full response body. Any non-success status is an error.
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, DaedalusError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, DaedalusError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("daedalus/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DaedalusError::Filesystem(err.to_string()))?,
        );
        // BioMart queries over the whole human gene set can take minutes.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(900))
            .build()
            .map_err(|err| DaedalusError::FetchHttp {
                url: String::new(),
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn send_with_retries<F>(
        &self,
        url: &str,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, DaedalusError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 500;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(DaedalusError::FetchHttp {
                        url: url.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, DaedalusError> {
        let response = self.send_with_retries(&request.url, || {
            let mut builder = self.client.get(&request.url);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown reason")
                .to_string();
            error!(url = %request.url, status, "request got response {status} -- {reason}");
            let message = response.text().unwrap_or(reason);
            return Err(DaedalusError::FetchStatus {
                url: request.url.clone(),
                status,
                message,
            });
        }

        info!(url = %request.url, "retrieving response");
        let size = response.content_length();
        let bar = progress::download_bar(size, &request.url, self.show_progress);
        let mut body = Vec::with_capacity(size.unwrap_or(0) as usize);
        bar.wrap_read(response)
            .read_to_end(&mut body)
            .map_err(|err| DaedalusError::FetchHttp {
                url: request.url.clone(),
                message: err.to_string(),
            })?;
        bar.finish_and_clear();
        info!(
            url = %request.url,
            size = %progress::format_bytes(body.len() as u64),
            "retrieved response"
        );
        Ok(body)
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
