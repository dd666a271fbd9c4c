// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{fmt, future::Future, sync::Arc};

use chrono::Duration;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    error::{ArgumentError, AuthorizationError, TokenRequestError},
    generator::TokenGenerator,
    http_service::HttpService,
    requests::{
        authorization::{LoginRequest, build_login_request},
        token::{TokenGrant, request_access_token},
    },
    types::{AccessToken, AuthSetting, client_credentials::ClientCredentials},
    utils::endpoint,
};

/// How long the client assertions generated for each request are valid, in
/// seconds, unless configured otherwise.
pub const DEFAULT_ASSERTION_VALIDITY_SECONDS: i64 = 300;

/// A client for Apple's authorization server.
///
/// It is cheap to clone, and can be shared between tasks.
#[derive(Clone)]
pub struct AppleAuthClient {
    settings: AuthSetting,
    token_generator: Arc<dyn TokenGenerator>,
    http_service: HttpService,
    assertion_validity: Duration,
    timeout: Option<std::time::Duration>,
}

impl fmt::Debug for AppleAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleAuthClient")
            .field("settings", &self.settings)
            .field("assertion_validity", &self.assertion_validity)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AppleAuthClient {
    /// Create a new client with the default options.
    #[must_use]
    pub fn new(
        settings: AuthSetting,
        token_generator: Arc<dyn TokenGenerator>,
        http_service: HttpService,
    ) -> Self {
        Self {
            settings,
            token_generator,
            http_service,
            assertion_validity: Duration::seconds(DEFAULT_ASSERTION_VALIDITY_SECONDS),
            timeout: None,
        }
    }

    /// Start building a client.
    #[must_use]
    pub fn builder() -> AppleAuthClientBuilder {
        AppleAuthClientBuilder::default()
    }

    /// The settings of this client.
    #[must_use]
    pub fn settings(&self) -> &AuthSetting {
        &self.settings
    }

    /// Build the URI to redirect the end-user to, with a fresh `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider base URI can't be used as a base.
    pub fn login_uri(&self) -> Result<Url, AuthorizationError> {
        Ok(self.login_request()?.url)
    }

    /// Build the URI to redirect the end-user to, using the given RNG for the
    /// `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider base URI can't be used as a base.
    pub fn login_uri_with_rng(&self, rng: &mut impl Rng) -> Result<Url, AuthorizationError> {
        Ok(build_login_request(&self.settings, rng)?.url)
    }

    /// Build the URI to redirect the end-user to, and return the `state` to
    /// check on the redirect URI alongside it.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider base URI can't be used as a base.
    pub fn login_request(&self) -> Result<LoginRequest, AuthorizationError> {
        // The state must come from a CSPRNG
        #[allow(clippy::disallowed_methods)]
        let mut rng = rand::thread_rng();
        build_login_request(&self.settings, &mut rng)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the client assertion could not be generated, if
    /// the request failed, or if the provider rejected it.
    pub async fn access_token(&self, code: &str) -> Result<AccessToken, TokenRequestError> {
        self.exchange(self.authorization_code_grant(code)).await
    }

    /// Like [`Self::access_token`], but fails with
    /// [`TokenRequestError::Cancelled`] if the token is cancelled first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::access_token`].
    pub async fn access_token_cancellable(
        &self,
        code: &str,
        cancellation: &CancellationToken,
    ) -> Result<AccessToken, TokenRequestError> {
        let grant = self.authorization_code_grant(code);
        cancellable(self.exchange(grant), cancellation).await
    }

    /// Get new tokens with a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the client assertion could not be generated, if
    /// the request failed, or if the provider rejected it.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<AccessToken, TokenRequestError> {
        self.exchange(refresh_token_grant(refresh_token)).await
    }

    /// Like [`Self::refresh_token`], but fails with
    /// [`TokenRequestError::Cancelled`] if the token is cancelled first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::refresh_token`].
    pub async fn refresh_token_cancellable(
        &self,
        refresh_token: &str,
        cancellation: &CancellationToken,
    ) -> Result<AccessToken, TokenRequestError> {
        cancellable(
            self.exchange(refresh_token_grant(refresh_token)),
            cancellation,
        )
        .await
    }

    fn authorization_code_grant(&self, code: &str) -> TokenGrant {
        TokenGrant::AuthorizationCode {
            code: code.to_owned(),
            redirect_uri: self.settings.redirect_uri().to_owned(),
        }
    }

    async fn exchange(&self, grant: TokenGrant) -> Result<AccessToken, TokenRequestError> {
        let token_endpoint = endpoint(self.settings.provider_base_uri(), &["auth", "token"])
            .ok_or(TokenRequestError::InvalidEndpoint)?;

        // A fresh assertion for every request
        let client_credentials = ClientCredentials::generate(
            self.settings.client_id(),
            self.token_generator.as_ref(),
            self.assertion_validity,
        )?;

        let request = request_access_token(
            &self.http_service,
            &client_credentials,
            &token_endpoint,
            grant,
        );

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .map_err(|_| TokenRequestError::Timeout)?,
            None => request.await,
        }
    }
}

fn refresh_token_grant(refresh_token: &str) -> TokenGrant {
    TokenGrant::RefreshToken {
        refresh_token: refresh_token.to_owned(),
    }
}

async fn cancellable<F>(
    future: F,
    cancellation: &CancellationToken,
) -> Result<AccessToken, TokenRequestError>
where
    F: Future<Output = Result<AccessToken, TokenRequestError>>,
{
    cancellation
        .run_until_cancelled(future)
        .await
        .unwrap_or(Err(TokenRequestError::Cancelled))
}

/// A builder for [`AppleAuthClient`].
#[derive(Default)]
pub struct AppleAuthClientBuilder {
    settings: Option<AuthSetting>,
    token_generator: Option<Arc<dyn TokenGenerator>>,
    http_service: Option<HttpService>,
    assertion_validity: Option<Duration>,
    timeout: Option<std::time::Duration>,
}

impl fmt::Debug for AppleAuthClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleAuthClientBuilder")
            .field("settings", &self.settings)
            .field("token_generator", &self.token_generator.is_some())
            .field("http_service", &self.http_service.is_some())
            .field("assertion_validity", &self.assertion_validity)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AppleAuthClientBuilder {
    /// Set the settings of the client. Required.
    #[must_use]
    pub fn settings(mut self, settings: AuthSetting) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the generator of client assertions. Required.
    #[must_use]
    pub fn token_generator(mut self, token_generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = Some(token_generator);
        self
    }

    /// Set the HTTP service used to reach the token endpoint. Required.
    #[must_use]
    pub fn http_service(mut self, http_service: HttpService) -> Self {
        self.http_service = Some(http_service);
        self
    }

    /// Set how long the client assertions are valid. Defaults to 5 minutes.
    #[must_use]
    pub fn assertion_validity(mut self, assertion_validity: Duration) -> Self {
        self.assertion_validity = Some(assertion_validity);
        self
    }

    /// Fail token requests which take longer than the given duration.
    #[must_use]
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] if the settings, the token generator
    /// or the HTTP service were not set.
    pub fn build(self) -> Result<AppleAuthClient, ArgumentError> {
        let settings = self.settings.ok_or(ArgumentError::Missing("settings"))?;
        let token_generator = self
            .token_generator
            .ok_or(ArgumentError::Missing("token_generator"))?;
        let http_service = self
            .http_service
            .ok_or(ArgumentError::Missing("http_service"))?;

        let mut client = AppleAuthClient::new(settings, token_generator, http_service);
        if let Some(assertion_validity) = self.assertion_validity {
            client.assertion_validity = assertion_validity;
        }
        client.timeout = self.timeout;

        Ok(client)
    }
}
