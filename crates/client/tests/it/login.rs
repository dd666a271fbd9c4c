// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::{HashMap, HashSet};

use http::StatusCode;
use rand::SeedableRng;

use crate::{CLIENT_ID, REDIRECT_URI, client_with, stub_service};

#[test]
fn login_uri_parameters() {
    let (http_service, requests) = stub_service(StatusCode::OK, "");
    let client = siwa_client::AppleAuthClient::new(
        crate::settings("https://appleid.apple.com", Some("x y z")),
        std::sync::Arc::new(crate::StaticTokenGenerator),
        http_service,
    );

    let uri = client.login_uri().unwrap();

    assert_eq!(uri.scheme(), "https");
    assert_eq!(uri.host_str(), Some("appleid.apple.com"));
    assert_eq!(uri.path(), "/auth/authorize");

    let query: HashMap<String, String> = uri.query_pairs().into_owned().collect();
    let keys: HashSet<&str> = query.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        HashSet::from([
            "response_type",
            "client_id",
            "redirect_uri",
            "state",
            "scope",
            "response_mode"
        ])
    );

    assert_eq!(query["response_type"], "code id_token");
    assert_eq!(query["response_mode"], "form_post");
    assert_eq!(query["client_id"], CLIENT_ID);
    assert_eq!(query["redirect_uri"], REDIRECT_URI);
    assert_eq!(query["scope"], "x y z");
    assert!(!query["state"].is_empty());

    // The redirect URI is percent-encoded in the raw query
    let raw_query = uri.query().unwrap();
    assert!(raw_query.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fapple%2Fcallback"));

    // Building a URI is not sending anything
    assert!(requests.lock().unwrap().is_empty());
}

#[test]
fn login_uri_keeps_redirect_uri_verbatim() {
    let (http_service, _) = stub_service(StatusCode::OK, "");
    let settings = siwa_client::types::AuthSetting::new(
        "b",
        "https://apple.com",
        "https://apple.com",
        Some("x y z"),
    )
    .unwrap();
    let client = siwa_client::AppleAuthClient::new(
        settings,
        std::sync::Arc::new(crate::StaticTokenGenerator),
        http_service,
    );

    let uri = client.login_uri().unwrap();
    let query: HashMap<String, String> = uri.query_pairs().into_owned().collect();
    assert_eq!(query["redirect_uri"], "https://apple.com");
    assert_eq!(query["client_id"], "b");
    assert_eq!(query["scope"], "x y z");
}

#[test]
fn login_uri_without_scope() {
    let (http_service, _) = stub_service(StatusCode::OK, "");
    let client = siwa_client::AppleAuthClient::new(
        crate::settings("https://appleid.apple.com", None),
        std::sync::Arc::new(crate::StaticTokenGenerator),
        http_service,
    );

    let uri = client.login_uri().unwrap();
    assert!(!uri.query_pairs().any(|(key, _)| key == "scope"));
}

#[test]
fn login_uri_state_is_fresh() {
    let (http_service, _) = stub_service(StatusCode::OK, "");
    let client = client_with(http_service);

    let state = |uri: url::Url| {
        uri.query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    };

    let first = state(client.login_uri().unwrap());
    let second = state(client.login_uri().unwrap());
    assert_ne!(first, second);

    // Also with a caller-provided RNG
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
    let third = state(client.login_uri_with_rng(&mut rng).unwrap());
    let fourth = state(client.login_uri_with_rng(&mut rng).unwrap());
    assert_ne!(third, fourth);
}

#[test]
fn login_request_returns_the_state() {
    let (http_service, _) = stub_service(StatusCode::OK, "");
    let client = client_with(http_service);

    let request = client.login_request().unwrap();
    assert!(
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "state" && value == request.state)
    );
}
