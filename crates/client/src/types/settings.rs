// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Static configuration of the client and of its signing key.

use std::fmt;

use url::Url;

use crate::error::ArgumentError;

/// The base URI of Apple's production authorization server.
pub const APPLE_PROVIDER_BASE_URI: &str = "https://appleid.apple.com";

/// The settings of a Sign in with Apple relying party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSetting {
    client_id: String,
    redirect_uri: String,
    provider_base_uri: Url,
    scope: Option<String>,
}

fn parse_http_url(field: &'static str, value: &str) -> Result<Url, ArgumentError> {
    if value.trim().is_empty() {
        return Err(ArgumentError::Empty(field));
    }

    let url = Url::parse(value).map_err(|source| ArgumentError::InvalidUrl { field, source })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ArgumentError::UnsupportedScheme { field }),
    }
}

impl AuthSetting {
    /// Create new settings.
    ///
    /// # Parameters
    ///
    /// * `client_id` - The Services ID registered in the Apple Developer
    ///   portal.
    /// * `redirect_uri` - Where Apple posts the authorization response back.
    /// * `provider_base_uri` - The base URI of the provider, usually
    ///   `https://appleid.apple.com`.
    /// * `scope` - The space-separated scopes to request, if any. An empty
    ///   scope is the same as no scope.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is empty, or if one of the URIs
    /// is not an absolute `http` or `https` URL.
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: &str,
        provider_base_uri: &str,
        scope: Option<&str>,
    ) -> Result<Self, ArgumentError> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(ArgumentError::Empty("client_id"));
        }

        // Apple compares the redirect URI byte for byte with the registered one
        parse_http_url("redirect_uri", redirect_uri)?;
        let redirect_uri = redirect_uri.to_owned();
        let provider_base_uri = parse_http_url("provider_base_uri", provider_base_uri)?;
        let scope = scope
            .filter(|scope| !scope.trim().is_empty())
            .map(ToOwned::to_owned);

        Ok(Self {
            client_id,
            redirect_uri,
            provider_base_uri,
            scope,
        })
    }

    /// The client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The redirect URI, exactly as given.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// The base URI of the provider.
    #[must_use]
    pub fn provider_base_uri(&self) -> &Url {
        &self.provider_base_uri
    }

    /// The requested scope, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// The key used to sign client assertions.
#[derive(Clone, PartialEq, Eq)]
pub struct KeySetting {
    key_id: String,
    private_key: String,
}

impl KeySetting {
    /// Create a new key setting.
    ///
    /// The private key can be a PEM document, like the content of the
    /// `AuthKey_<key id>.p8` file downloaded from the Apple Developer portal,
    /// or just its base64 body.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the fields is empty.
    pub fn new(
        key_id: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        let key_id = key_id.into();
        if key_id.trim().is_empty() {
            return Err(ArgumentError::Empty("key_id"));
        }

        let private_key = private_key.into();
        if private_key.trim().is_empty() {
            return Err(ArgumentError::Empty("private_key"));
        }

        Ok(Self {
            key_id,
            private_key,
        })
    }

    /// The key ID, as shown in the Apple Developer portal.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The private key material.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for KeySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetting")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
