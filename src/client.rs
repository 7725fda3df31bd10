use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use url::Url;

use crate::accumulating_stream::AccumulatingStream;
use crate::client_logger::ClientLogger;
use crate::completion::{Completion, CompletionService};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::{ErrorResponse, process_sse};
use crate::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionParams};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client for OpenAI-compatible `chat/completions` APIs.
///
/// Construction never fails for lack of a credential.  A missing or empty key is reported as
/// an authentication error by the first request, so front ends can start and show the
/// problem where the user will see it.
#[derive(Clone)]
pub struct OpenAI {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl OpenAI {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the OPENAI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` points at any OpenAI-compatible API root, e.g. `http://localhost:8080/v1/`.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.or_else(|| env::var(API_KEY_ENV).ok());

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)
            .map_err(|e| Error::url(format!("Invalid base URL {base_url}: {e}"), Some(e)))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request, response and stream chunk.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a non-empty credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                )));
            }
        };
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::authentication("API key contains characters not allowed in a header"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    fn completions_url(&self) -> Result<Url> {
        Ok(self.base_url.join("chat/completions")?)
    }

    /// Send a prepared request, mapping transport failures and error statuses.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(e.to_string(), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        // Get headers we might need for error processing
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_status(status_code, &error_body, request_id, retry_after)
    }

    /// Send a request to the API and get a non-streaming completion.
    pub async fn send(&self, mut params: ChatCompletionParams) -> Result<ChatCompletion> {
        params.stream = false;
        if let Some(logger) = &self.logger {
            logger.log_request(&params);
        }

        let request = self
            .client
            .post(self.completions_url()?)
            .headers(self.default_headers()?)
            .json(&params);
        let response = self.execute(request).await?;

        let completion = response.json::<ChatCompletion>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        if let Some(logger) = &self.logger {
            logger.log_response(&completion);
        }
        Ok(completion)
    }

    /// Send a request to the API and get a streaming response.
    ///
    /// Returns a stream of chunks that can be processed incrementally.
    pub async fn stream(
        &self,
        mut params: ChatCompletionParams,
    ) -> Result<impl Stream<Item = Result<ChatCompletionChunk>> + Send + use<>> {
        params.stream = true;
        if let Some(logger) = &self.logger {
            logger.log_request(&params);
        }

        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let request = self
            .client
            .post(self.completions_url()?)
            .headers(headers)
            .json(&params);
        let response = self.execute(request).await?;

        Ok(process_sse(Box::pin(response.bytes_stream())))
    }
}

impl fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAI")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl CompletionService for OpenAI {
    async fn stream_completion(&self, params: ChatCompletionParams) -> Result<Completion> {
        let chunks = self.stream(params).await?;
        let (fragments, reply) = AccumulatingStream::new(chunks);
        let fragments = match &self.logger {
            Some(logger) => fragments.with_logger(Arc::clone(logger)),
            None => fragments,
        };
        Ok(Completion::new(fragments, reply))
    }
}

/// Map an HTTP error status and body to our Error type.
fn error_from_status(
    status_code: u16,
    body: &str,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|response| response.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_message = detail
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());

    match status_code {
        400 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message, request_id),
    }
}
