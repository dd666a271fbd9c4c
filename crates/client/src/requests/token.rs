// Copyright 2025 New Vector Ltd.
// Copyright 2022-2024 Kévin Commaille.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Requests for the token endpoint.

use serde::Serialize;
use siwa_http::{CatchHttpCodesLayer, FormUrlencodedRequestLayer, JsonResponseLayer};
use tower::{Layer, Service, ServiceExt};
use url::Url;

use crate::{
    error::TokenRequestError,
    http_service::HttpService,
    types::{AccessToken, client_credentials::ClientCredentials},
    utils::{provider_error_mapper, success_status_codes},
};

/// The grants accepted by the token endpoint.
#[derive(Clone, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenGrant {
    /// Exchange an authorization code.
    AuthorizationCode {
        /// The code posted to the redirect URI.
        code: String,

        /// The redirect URI used in the authorization request, verbatim.
        redirect_uri: String,
    },

    /// Get new tokens with a refresh token.
    RefreshToken {
        /// The refresh token.
        refresh_token: String,
    },
}

impl TokenGrant {
    /// The value of the `grant_type` parameter for this grant.
    #[must_use]
    pub const fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorizationCode { redirect_uri, .. } => f
                .debug_struct("AuthorizationCode")
                .field("redirect_uri", redirect_uri)
                .finish_non_exhaustive(),
            Self::RefreshToken { .. } => f.debug_struct("RefreshToken").finish_non_exhaustive(),
        }
    }
}

/// Request tokens at the token endpoint.
///
/// # Arguments
///
/// * `http_service` - The service to use for making HTTP requests.
///
/// * `client_credentials` - The client ID and a freshly generated client
///   assertion.
///
/// * `token_endpoint` - The URL of the provider's token endpoint.
///
/// * `grant` - The grant to exchange.
///
/// # Errors
///
/// Returns an error if the request fails, if the provider rejects it, or if
/// the response is invalid.
#[tracing::instrument(skip_all, fields(%token_endpoint, grant_type = grant.grant_type()))]
pub async fn request_access_token(
    http_service: &HttpService,
    client_credentials: &ClientCredentials,
    token_endpoint: &Url,
    grant: TokenGrant,
) -> Result<AccessToken, TokenRequestError> {
    tracing::debug!("Requesting access token...");

    let token_request = http::Request::post(token_endpoint.as_str()).body(grant)?;

    let token_request = client_credentials.apply_to_request(token_request);

    let service = (
        FormUrlencodedRequestLayer::default(),
        JsonResponseLayer::<AccessToken>::default(),
        CatchHttpCodesLayer::except(success_status_codes(), provider_error_mapper),
    )
        .layer(http_service.clone());

    let res = service
        .ready_oneshot()
        .await?
        .call(token_request)
        .await
        .map_err(TokenRequestError::from);

    match res {
        Ok(res) => Ok(res.into_body()),
        Err(TokenRequestError::Provider(err)) => {
            tracing::warn!(status = %err.status(), "Token endpoint rejected the request");
            Err(TokenRequestError::Provider(err))
        }
        Err(err) => Err(err),
    }
}
