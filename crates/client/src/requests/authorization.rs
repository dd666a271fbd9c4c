// Copyright 2025 New Vector Ltd.
// Copyright 2022-2024 Kévin Commaille.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Requests for the authorization endpoint.

use rand::{
    Rng,
    distributions::{Alphanumeric, DistString},
};
use serde::Serialize;
use url::Url;

use crate::{error::AuthorizationError, types::AuthSetting, utils::endpoint};

/// The length of the random `state` parameter.
pub const STATE_LENGTH: usize = 32;

/// Apple returns both an authorization code and an ID token.
const RESPONSE_TYPE: &str = "code id_token";

/// Apple requires `form_post` whenever scopes are requested.
const RESPONSE_MODE: &str = "form_post";

/// A login URI, along with the state to check when the end-user comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// The URI to redirect the end-user to.
    pub url: Url,

    /// The `state` included in the URI, echoed back to the redirect URI.
    pub state: String,
}

#[derive(Serialize)]
struct AuthorizationRequest<'a> {
    response_type: &'static str,
    client_id: &'a str,
    redirect_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    response_mode: &'static str,
    state: &'a str,
}

/// Build the URI of the authorization endpoint the end-user should be
/// redirected to.
///
/// # Errors
///
/// Returns an error if the provider base URI can't be used as a base, or if
/// the query could not be serialized.
pub fn build_login_request(
    settings: &AuthSetting,
    rng: &mut impl Rng,
) -> Result<LoginRequest, AuthorizationError> {
    let mut authorization_url = endpoint(settings.provider_base_uri(), &["auth", "authorize"])
        .ok_or(AuthorizationError::InvalidEndpoint)?;

    let state = Alphanumeric.sample_string(rng, STATE_LENGTH);

    tracing::debug!(scope = settings.scope(), "Building login URI...");

    let authorization_query = serde_urlencoded::to_string(AuthorizationRequest {
        response_type: RESPONSE_TYPE,
        client_id: settings.client_id(),
        redirect_uri: settings.redirect_uri(),
        scope: settings.scope(),
        response_mode: RESPONSE_MODE,
        state: &state,
    })?;

    // Add our parameters to the query, because the URL might already have one.
    let mut full_query = authorization_url
        .query()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    if !full_query.is_empty() {
        full_query.push('&');
    }
    full_query.push_str(&authorization_query);

    authorization_url.set_query(Some(&full_query));

    Ok(LoginRequest {
        url: authorization_url,
        state,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;

    use super::*;

    fn settings(base: &str, scope: Option<&str>) -> AuthSetting {
        AuthSetting::new(
            "com.example.app",
            "https://example.com/callback",
            base,
            scope,
        )
        .unwrap()
    }

    #[test]
    fn without_scope() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let request = build_login_request(&settings("https://appleid.apple.com", None), &mut rng)
            .unwrap();

        assert_eq!(request.url.path(), "/auth/authorize");
        assert_eq!(request.state.len(), STATE_LENGTH);
        assert!(request.state.chars().all(|c| c.is_ascii_alphanumeric()));

        let query: HashMap<_, _> = request.url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 5);
        assert!(!query.contains_key("scope"));
        assert_eq!(query["state"], request.state);
    }

    #[test]
    fn keeps_existing_query() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let request = build_login_request(
            &settings("https://appleid.apple.com/?locale=fr_FR", Some("email")),
            &mut rng,
        )
        .unwrap();

        let pairs: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("locale".to_owned(), "fr_FR".to_owned()));
        assert_eq!(pairs.len(), 7);
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let settings = settings("https://appleid.apple.com", None);
        let first = build_login_request(
            &settings,
            &mut rand_chacha::ChaCha8Rng::seed_from_u64(42),
        )
        .unwrap();
        let second = build_login_request(
            &settings,
            &mut rand_chacha::ChaCha8Rng::seed_from_u64(42),
        )
        .unwrap();

        assert_eq!(first, second);
    }
}
