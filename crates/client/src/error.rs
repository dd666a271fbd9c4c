// Copyright 2025 New Vector Ltd.
// Copyright 2022-2024 Kévin Commaille.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The error types used in this crate.

use http::StatusCode;
use serde::Deserialize;
use siwa_http::{catch_http_codes, form_urlencoded_request, json_response};
use siwa_jose::{claims::ClaimError, jwt::JwtSignatureError};
use thiserror::Error;
pub use tower::BoxError;

/// An invalid or missing argument when constructing a value.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// A required argument was not provided.
    #[error("missing required argument `{0}`")]
    Missing(&'static str),

    /// A required argument was empty.
    #[error("argument `{0}` must not be empty")]
    Empty(&'static str),

    /// An argument is not a valid URL.
    #[error("argument `{field}` is not a valid URL")]
    InvalidUrl {
        /// The name of the argument.
        field: &'static str,

        /// The parsing error.
        #[source]
        source: url::ParseError,
    },

    /// An argument is a URL, but not an `http` or `https` one.
    #[error("argument `{field}` must be an http or https URL")]
    UnsupportedScheme {
        /// The name of the argument.
        field: &'static str,
    },
}

/// All possible errors when generating a client assertion.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The private key could not be loaded.
    #[error("invalid private key")]
    InvalidKey(#[from] siwa_keystore::LoadError),

    /// The requested validity is not accepted by the provider.
    #[error("invalid assertion validity of {validity}, it must be positive and at most 180 days")]
    InvalidValidity {
        /// The requested validity.
        validity: chrono::Duration,
    },

    /// A claim could not be set.
    #[error(transparent)]
    Claims(#[from] ClaimError),

    /// The assertion could not be signed.
    #[error(transparent)]
    Signature(#[from] JwtSignatureError),
}

/// All possible errors when building the login URI.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The provider base URI cannot be extended with the authorization path.
    #[error("the provider base URI cannot be used as a base")]
    InvalidEndpoint,

    /// An error occurred serializing the request.
    #[error(transparent)]
    UrlEncoded(#[from] serde_urlencoded::ser::Error),
}

/// An error response from the provider's token endpoint.
///
/// Its message is the raw body of the response.
#[derive(Debug, Clone, Error)]
#[error("{body}")]
pub struct ProviderError {
    status: StatusCode,
    body: String,
}

impl ProviderError {
    /// Construct a `ProviderError` from the status and body of a response.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The status code of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw body of the response.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Try to parse the body as a standard OAuth 2.0 error response.
    ///
    /// Returns `None` if the body is not such a JSON document.
    #[must_use]
    pub fn error_body(&self) -> Option<ErrorBody> {
        serde_json::from_str(&self.body).ok()
    }
}

/// A standard OAuth 2.0 error response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    /// The error code, like `invalid_grant`.
    pub error: String,

    /// A human-readable description of the error.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// All possible errors when requesting tokens at the token endpoint.
#[derive(Debug, Error)]
pub enum TokenRequestError {
    /// The request could not be sent, or the response could not be read.
    #[error("failed to send the token request")]
    Transport(#[source] BoxError),

    /// The provider rejected the request.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The client assertion could not be generated.
    #[error(transparent)]
    Credentials(#[from] SigningError),

    /// The response body is not a valid token response.
    #[error("failed to decode the token response")]
    Decode(#[source] serde_json::Error),

    /// The request body could not be encoded.
    #[error("failed to encode the token request")]
    Encode(#[source] serde_urlencoded::ser::Error),

    /// The provider base URI cannot be extended with the token path.
    #[error("the provider base URI cannot be used as a base")]
    InvalidEndpoint,

    /// The HTTP request could not be built.
    #[error(transparent)]
    Request(#[from] http::Error),

    /// The caller cancelled the request.
    #[error("the token request was cancelled")]
    Cancelled,

    /// The request did not complete in time.
    #[error("the token request timed out")]
    Timeout,
}

type TokenServiceError = form_urlencoded_request::Error<
    json_response::Error<catch_http_codes::Error<BoxError, ProviderError>>,
>;

impl From<TokenServiceError> for TokenRequestError {
    fn from(err: TokenServiceError) -> Self {
        match err {
            form_urlencoded_request::Error::Serialize { inner } => Self::Encode(inner),
            form_urlencoded_request::Error::Service { inner } => match inner {
                json_response::Error::Deserialize { inner } => Self::Decode(inner),
                json_response::Error::Service { inner } => match inner {
                    catch_http_codes::Error::HttpError { inner, .. } => Self::Provider(inner),
                    catch_http_codes::Error::Service { inner } => Self::Transport(inner),
                },
            },
        }
    }
}
