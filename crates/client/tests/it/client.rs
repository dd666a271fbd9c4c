// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::Arc;

use assert_matches::assert_matches;
use http::StatusCode;
use siwa_client::{AppleAuthClient, TokenGenerator, error::ArgumentError};

use crate::{StaticTokenGenerator, settings, stub_service};

fn generator() -> Arc<dyn TokenGenerator> {
    Arc::new(StaticTokenGenerator)
}

#[test]
fn builder_requires_settings() {
    let (http_service, _) = stub_service(StatusCode::OK, "");

    let res = AppleAuthClient::builder()
        .token_generator(generator())
        .http_service(http_service)
        .build();

    assert_matches!(res, Err(ArgumentError::Missing("settings")));
}

#[test]
fn builder_requires_token_generator() {
    let (http_service, _) = stub_service(StatusCode::OK, "");

    let res = AppleAuthClient::builder()
        .settings(settings("https://appleid.apple.com", None))
        .http_service(http_service)
        .build();

    assert_matches!(res, Err(ArgumentError::Missing("token_generator")));
}

#[test]
fn builder_requires_http_service() {
    let res = AppleAuthClient::builder()
        .settings(settings("https://appleid.apple.com", None))
        .token_generator(generator())
        .build();

    assert_matches!(res, Err(ArgumentError::Missing("http_service")));
}

#[test]
fn builder_with_everything() {
    let (http_service, _) = stub_service(StatusCode::OK, "");

    let client = AppleAuthClient::builder()
        .settings(settings("https://appleid.apple.com", None))
        .token_generator(generator())
        .http_service(http_service)
        .assertion_validity(chrono::Duration::minutes(1))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap();

    assert_eq!(client.settings().client_id(), crate::CLIENT_ID);
}

#[test]
fn settings_require_non_empty_fields() {
    use siwa_client::types::AuthSetting;

    assert_matches!(
        AuthSetting::new("", crate::REDIRECT_URI, "https://appleid.apple.com", None),
        Err(ArgumentError::Empty("client_id"))
    );
    assert_matches!(
        AuthSetting::new(crate::CLIENT_ID, "", "https://appleid.apple.com", None),
        Err(ArgumentError::Empty("redirect_uri"))
    );
    assert_matches!(
        AuthSetting::new(crate::CLIENT_ID, crate::REDIRECT_URI, "", None),
        Err(ArgumentError::Empty("provider_base_uri"))
    );
}
