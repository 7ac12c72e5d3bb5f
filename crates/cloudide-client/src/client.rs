//! Shared HTTP client: one reqwest client, one endpoint pair, one interceptor chain.
//!
//! # Design
//! - Constructed once at bootstrap and handed to callers; cloning is cheap.
//! - Paths resolve as `origin + api_base + path`; absolute URLs are used as-is.
//! - Every call runs the request stages before sending and exactly one of the
//!   success/failure response paths afterwards.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cloudide_config::ClientEndpoints;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::BearerTokenInterceptor;
use crate::error::{ClientError, ClientResult};
use crate::guard::StatusGuard;
use crate::i18n::TranslationBundle;
use crate::interceptor::{
    InterceptorChain, LoggingInterceptor, RequestInterceptor, ResponseInterceptor,
};
use crate::navigation::Navigator;
use crate::notify::Notifier;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::session::SessionStore;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Collaborators the standard interceptor chain reacts through.
#[derive(Clone)]
pub struct ClientServices {
    /// Session storage holding the bearer token.
    pub session: Arc<dyn SessionStore>,
    /// Router used for the login redirect.
    pub navigator: Arc<dyn Navigator>,
    /// Sink for user-facing messages.
    pub notifier: Arc<dyn Notifier>,
    /// Messages for the active locale.
    pub messages: TranslationBundle,
}

impl fmt::Debug for ClientServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientServices")
            .field("locale", &self.messages.locale())
            .finish_non_exhaustive()
    }
}

impl ClientServices {
    /// Default chain: bearer token then logging on the way out, status guard
    /// then logging on the way back.
    #[must_use]
    pub fn standard_chain(&self) -> InterceptorChain {
        InterceptorChain::new()
            .with_request(Arc::new(BearerTokenInterceptor::new(self.session.clone())))
            .with_request(Arc::new(LoggingInterceptor))
            .with_response(Arc::new(StatusGuard::new(
                self.session.clone(),
                self.navigator.clone(),
                self.notifier.clone(),
                self.messages.clone(),
            )))
            .with_response(Arc::new(LoggingInterceptor))
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    endpoints: ClientEndpoints,
    origin: Url,
    timeout: Duration,
    chain: InterceptorChain,
}

impl HttpClientBuilder {
    /// Override the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the whole interceptor chain.
    #[must_use]
    pub fn chain(mut self, chain: InterceptorChain) -> Self {
        self.chain = chain;
        self
    }

    /// Append a request stage.
    #[must_use]
    pub fn request_interceptor(mut self, stage: Arc<dyn RequestInterceptor>) -> Self {
        self.chain = self.chain.with_request(stage);
        self
    }

    /// Append a response stage.
    #[must_use]
    pub fn response_interceptor(mut self, stage: Arc<dyn ResponseInterceptor>) -> Self {
        self.chain = self.chain.with_response(stage);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the TLS backend cannot be initialised.
    pub fn build(self) -> ClientResult<HttpClient> {
        let inner = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|source| ClientError::Build { source })?;
        tracing::debug!(
            origin = %self.origin,
            api_base = %self.endpoints.api_base,
            workspace_url = %self.endpoints.workspace_url,
            "http client configured"
        );
        Ok(HttpClient {
            inner,
            origin: self.origin,
            endpoints: self.endpoints,
            chain: self.chain,
        })
    }
}

/// Shared portal HTTP client.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    origin: Url,
    endpoints: ClientEndpoints,
    chain: InterceptorChain,
}

impl HttpClient {
    /// Start building a client for `endpoints`, resolving relative bases
    /// against `origin`.
    #[must_use]
    pub fn builder(endpoints: ClientEndpoints, origin: Url) -> HttpClientBuilder {
        HttpClientBuilder {
            endpoints,
            origin,
            timeout: DEFAULT_TIMEOUT,
            chain: InterceptorChain::new(),
        }
    }

    /// Client with the standard interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the underlying client cannot be built.
    pub fn standard(
        endpoints: ClientEndpoints,
        origin: Url,
        services: &ClientServices,
    ) -> ClientResult<Self> {
        Self::builder(endpoints, origin)
            .chain(services.standard_chain())
            .build()
    }

    /// Endpoint pair the client was configured with.
    #[must_use]
    pub const fn endpoints(&self) -> &ClientEndpoints {
        &self.endpoints
    }

    /// Origin relative bases resolve against.
    #[must_use]
    pub const fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve a caller path into the URL that will be requested.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when the combination is not a URL.
    pub fn resolve(&self, path: &str) -> ClientResult<Url> {
        if let Ok(absolute) = Url::parse(path) {
            if matches!(absolute.scheme(), "http" | "https") {
                return Ok(absolute);
            }
        }
        let base = self.endpoints.api_base.trim_end_matches('/');
        let combined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        self.origin
            .join(&combined)
            .map_err(|source| ClientError::InvalidUrl {
                value: combined,
                source,
            })
    }

    /// Join `path` onto the workspace base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when the result is not a URL.
    pub fn workspace_url(&self, path: &str) -> ClientResult<Url> {
        self.endpoints
            .workspace_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ClientError::InvalidUrl {
                value: path.to_string(),
                source,
            })
    }

    /// Send one request through the interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns the (interceptor-processed) [`ClientError::Status`] for non-2xx
    /// responses, [`ClientError::Transport`] when no response arrived, and
    /// [`ClientError::InvalidUrl`] when the path cannot be resolved.
    pub async fn send(&self, request: RequestDescriptor) -> ClientResult<ApiResponse> {
        let request = self.chain.apply_request(request);
        let mut url = self.resolve(&request.path)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        let method = request.method;
        let mut builder = self
            .inner
            .request(method.clone(), url.clone())
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                return Err(self.chain.apply_error(ClientError::Transport {
                    method,
                    url,
                    source,
                }));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => {
                return Err(self.chain.apply_error(ClientError::Transport {
                    method,
                    url,
                    source,
                }));
            }
        };

        if status.is_success() {
            Ok(self.chain.apply_response(ApiResponse {
                url,
                status,
                headers,
                body,
            }))
        } else {
            Err(self.chain.apply_error(ClientError::Status {
                method,
                url,
                status,
                headers,
                body,
            }))
        }
    }

    /// `GET` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send`]; additionally [`ClientError::Decode`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(RequestDescriptor::get(path)).await?.json()
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send`]; additionally [`ClientError::Encode`] and
    /// [`ClientError::Decode`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestDescriptor::post(path).with_json(body)?)
            .await?
            .json()
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::post_json`].
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestDescriptor::put(path).with_json(body)?)
            .await?
            .json()
    }

    /// `DELETE` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::post_json`].
    pub async fn delete_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestDescriptor::delete(path).with_json(body)?)
            .await?
            .json()
    }
}
