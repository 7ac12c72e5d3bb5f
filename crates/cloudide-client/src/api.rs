//! Typed calls against the portal backend.
//!
//! Every response body is an envelope `{status, message, data}`. HTTP-level
//! failures surface as [`ClientError::Status`] after the interceptor chain has
//! reacted; business failures inside a 2xx envelope surface as
//! [`ClientError::Rejected`].

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::HttpClient;
use crate::error::{ClientError, ClientResult};
use crate::request::RequestDescriptor;
use crate::session::{SESSION_TOKEN_KEY, SessionStore};

/// Response envelope used by every portal endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Envelope<T> {
    /// Portal status code (see [`PortalCode`]).
    pub status: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Payload, absent on failures.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Known code carried by the envelope.
    #[must_use]
    pub fn code(&self) -> Option<PortalCode> {
        PortalCode::from_code(self.status)
    }

    /// Fail with [`ClientError::Rejected`] when the code is a known failure.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] carrying the envelope status and message.
    pub fn into_result(self) -> ClientResult<Self> {
        if self.code().is_some_and(PortalCode::is_failure) {
            return Err(ClientError::Rejected {
                code: self.status,
                message: self.message,
            });
        }
        Ok(self)
    }
}

/// Status codes emitted by the portal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PortalCode {
    QuerySuccess = 10,
    QueryFailed,
    LoginSuccess,
    LoginFailed,
    LoginUserDeleted,
    LoginUserNotExist,
    LoginPasswordIncorrect,
    SpaceCreateSuccess,
    SpaceCreateFailed,
    SpaceCreateNameDuplicate,
    SpaceCreateReachMaxCount,
    SpaceStartSuccess,
    SpaceStartFailed,
    SpaceDeleteSuccess,
    SpaceDeleteFailed,
    SpaceDeleteIsRunning,
    SpaceStopSuccess,
    SpaceStopFailed,
    SpaceStopIsNotRunning,
    UserNameAvailable,
    UserNameUnavailable,
    UserSendValidateCodeSuccess,
    UserSendValidateCodeFailed,
    UserEmailCodeInvalid,
    UserEmailInvalid,
    UserUsernameExist,
    UserRegisterSuccess,
    UserRegisterFailed,
    UserEmailCodeIncorrect,
    UserEmailAlreadyInUse,
    UserNameLengthInvalid,
    UserEmailNotExists,
    UserPasswordLengthInvalid,
    UserResetPasswordFailed,
    SpaceStartNotExist,
    SpaceOtherSpaceIsRunning,
    SpaceNameModifySuccess,
    SpaceNameModifyFailed,
    SpaceAlreadyExist,
    SpaceNotFound,
    ResourceExhausted,
    PaymentSuccess,
    PaymentFailed,
    PaymentCallbackSuccess,
    PaymentCallbackFailed,
}

impl PortalCode {
    const ALL: [Self; 45] = [
        Self::QuerySuccess,
        Self::QueryFailed,
        Self::LoginSuccess,
        Self::LoginFailed,
        Self::LoginUserDeleted,
        Self::LoginUserNotExist,
        Self::LoginPasswordIncorrect,
        Self::SpaceCreateSuccess,
        Self::SpaceCreateFailed,
        Self::SpaceCreateNameDuplicate,
        Self::SpaceCreateReachMaxCount,
        Self::SpaceStartSuccess,
        Self::SpaceStartFailed,
        Self::SpaceDeleteSuccess,
        Self::SpaceDeleteFailed,
        Self::SpaceDeleteIsRunning,
        Self::SpaceStopSuccess,
        Self::SpaceStopFailed,
        Self::SpaceStopIsNotRunning,
        Self::UserNameAvailable,
        Self::UserNameUnavailable,
        Self::UserSendValidateCodeSuccess,
        Self::UserSendValidateCodeFailed,
        Self::UserEmailCodeInvalid,
        Self::UserEmailInvalid,
        Self::UserUsernameExist,
        Self::UserRegisterSuccess,
        Self::UserRegisterFailed,
        Self::UserEmailCodeIncorrect,
        Self::UserEmailAlreadyInUse,
        Self::UserNameLengthInvalid,
        Self::UserEmailNotExists,
        Self::UserPasswordLengthInvalid,
        Self::UserResetPasswordFailed,
        Self::SpaceStartNotExist,
        Self::SpaceOtherSpaceIsRunning,
        Self::SpaceNameModifySuccess,
        Self::SpaceNameModifyFailed,
        Self::SpaceAlreadyExist,
        Self::SpaceNotFound,
        Self::ResourceExhausted,
        Self::PaymentSuccess,
        Self::PaymentFailed,
        Self::PaymentCallbackSuccess,
        Self::PaymentCallbackFailed,
    ];

    /// Numeric value on the wire.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    /// Look up a wire value.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_i64() == code)
    }

    /// Whether the code reports a failed operation.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(
            self,
            Self::QuerySuccess
                | Self::LoginSuccess
                | Self::SpaceCreateSuccess
                | Self::SpaceStartSuccess
                | Self::SpaceDeleteSuccess
                | Self::SpaceStopSuccess
                | Self::UserNameAvailable
                | Self::UserSendValidateCodeSuccess
                | Self::UserRegisterSuccess
                | Self::SpaceNameModifySuccess
                | Self::PaymentSuccess
                | Self::PaymentCallbackSuccess
        )
    }
}

/// Logged-in user returned by `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserInfo {
    /// Numeric user id.
    #[serde(default)]
    pub id: u32,
    /// Stable user identifier.
    #[serde(default)]
    pub uid: String,
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub nickname: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: String,
    /// Session token.
    #[serde(default)]
    pub token: String,
}

/// Workspace template offered at creation time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpaceTemplate {
    /// Template id.
    pub id: u32,
    /// Template name.
    pub name: String,
    /// Remaining fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hardware specification offered at creation time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpaceSpec {
    /// Spec id.
    pub id: u32,
    /// Spec name.
    pub name: String,
    /// Remaining fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user's workspace.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Workspace {
    /// Workspace id.
    pub id: u32,
    /// Workspace name.
    #[serde(default)]
    pub name: String,
    /// Remaining fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for creating a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpaceCreateOption {
    /// Workspace name.
    pub name: String,
    /// Template id.
    pub tmpl_id: u32,
    /// Spec id.
    pub space_spec_id: u32,
    /// Owner id.
    pub user_id: u32,
    /// Repository cloned into the workspace.
    #[serde(default)]
    pub git_repository: String,
    /// Optional provider credentials and model names keyed by field name
    /// (`openai_api_key`, `big_model`, ...).
    #[serde(flatten)]
    pub provider_settings: std::collections::BTreeMap<String, String>,
}

/// Product listed on the payment page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaymentProduct {
    /// Product id.
    pub id: u32,
    /// Product name.
    pub name: String,
    /// Product kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Subscription length.
    pub duration_days: i32,
    /// Price.
    pub price: f64,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Availability flag.
    #[serde(default)]
    pub status: u8,
    /// Creation timestamp as sent by the server.
    #[serde(default)]
    pub create_time: String,
}

impl PaymentProduct {
    /// Creation time rendered for display.
    #[must_use]
    pub fn created_at_display(&self) -> String {
        crate::date::display_date(&self.create_time)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SpaceId {
    id: u32,
}

#[derive(Serialize)]
struct SpaceRename<'a> {
    name: &'a str,
    id: u32,
}

/// Portal calls on top of the shared client.
#[derive(Clone)]
pub struct PortalApi {
    http: HttpClient,
    session: Arc<dyn SessionStore>,
}

impl fmt::Debug for PortalApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalApi")
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

impl PortalApi {
    /// Wrap a client; `session` must be the store its interceptors read.
    #[must_use]
    pub fn new(http: HttpClient, session: Arc<dyn SessionStore>) -> Self {
        Self { http, session }
    }

    /// Underlying client.
    #[must_use]
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> ClientResult<Envelope<T>> {
        self.http.send(request).await?.json::<Envelope<T>>()
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let envelope = self
            .call::<Vec<T>>(RequestDescriptor::get(path))
            .await?
            .into_result()?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn required<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> ClientResult<T> {
        let envelope = self.call::<T>(request).await?.into_result()?;
        envelope.data.ok_or(ClientError::Rejected {
            code: envelope.status,
            message: envelope.message,
        })
    }

    async fn action(&self, request: RequestDescriptor) -> ClientResult<()> {
        self.call::<Value>(request).await?.into_result().map(drop)
    }

    /// Log in and store the returned token for later `/api` calls.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] when the portal refuses the
    /// credentials or returns no token.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<UserInfo> {
        let request =
            RequestDescriptor::post("/auth/login").with_json(&Credentials { username, password })?;
        let envelope = self.call::<UserInfo>(request).await?.into_result()?;
        let user = envelope
            .data
            .filter(|user| !user.token.trim().is_empty())
            .ok_or(ClientError::Rejected {
                code: envelope.status,
                message: envelope.message,
            })?;
        self.session.set(SESSION_TOKEN_KEY, user.token.clone());
        tracing::info!(username = %user.username, "logged in");
        Ok(user)
    }

    /// Drop the local session.
    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("logged out");
    }

    /// Whether `username` can still be registered.
    ///
    /// # Errors
    ///
    /// Propagates transport, status and decode errors.
    pub async fn check_username(&self, username: &str) -> ClientResult<bool> {
        let envelope = self
            .call::<Value>(
                RequestDescriptor::get("/auth/username/check").with_query("username", username),
            )
            .await?;
        if envelope.code() == Some(PortalCode::UserNameUnavailable) {
            return Ok(false);
        }
        envelope.into_result().map(|_| true)
    }

    /// Available workspace templates.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn list_templates(&self) -> ClientResult<Vec<SpaceTemplate>> {
        self.list("/api/template/list").await
    }

    /// Available hardware specs.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn list_specs(&self) -> ClientResult<Vec<SpaceSpec>> {
        self.list("/api/spec/list").await
    }

    /// Workspaces owned by the current user.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn list_workspaces(&self) -> ClientResult<Vec<Workspace>> {
        self.list("/api/workspace/list").await
    }

    /// Create a workspace without starting it.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn create_workspace(&self, option: &SpaceCreateOption) -> ClientResult<Workspace> {
        let request = RequestDescriptor::post("/api/workspace").with_json(option)?;
        self.required(request).await
    }

    /// Create a workspace and start it immediately.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn create_and_start_workspace(
        &self,
        option: &SpaceCreateOption,
    ) -> ClientResult<Workspace> {
        let request = RequestDescriptor::post("/api/workspace/cas").with_json(option)?;
        self.required(request).await
    }

    /// Start a stopped workspace.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn start_workspace(&self, id: u32) -> ClientResult<Workspace> {
        let request = RequestDescriptor::put("/api/workspace/start").with_json(&SpaceId { id })?;
        self.required(request).await
    }

    /// Stop a running workspace.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn stop_workspace(&self, id: u32) -> ClientResult<()> {
        let request = RequestDescriptor::put("/api/workspace/stop").with_json(&SpaceId { id })?;
        self.action(request).await
    }

    /// Delete a stopped workspace.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn delete_workspace(&self, id: u32) -> ClientResult<()> {
        let request = RequestDescriptor::delete("/api/workspace").with_json(&SpaceId { id })?;
        self.action(request).await
    }

    /// Rename a workspace.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn rename_workspace(&self, id: u32, name: &str) -> ClientResult<()> {
        let request =
            RequestDescriptor::put("/api/workspace/name").with_json(&SpaceRename { name, id })?;
        self.action(request).await
    }

    /// Products on the public payment page.
    ///
    /// # Errors
    ///
    /// Propagates client errors and rejected envelopes.
    pub async fn list_products(&self) -> ClientResult<Vec<PaymentProduct>> {
        self.list("/api/payment/products").await
    }
}
