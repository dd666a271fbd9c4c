// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! End-to-end tests against a mock server, through the reqwest transport.

use std::{net::TcpListener, sync::Arc};

use assert_matches::assert_matches;
use siwa_client::{AppleAuthClient, error::TokenRequestError};
use url::Url;
use wiremock::{
    Mock, MockServer, Request, ResponseTemplate,
    matchers::{header, method, path},
};

use crate::{
    AUTHORIZATION_CODE, CLIENT_ID, REDIRECT_URI, REFRESH_TOKEN, access_token,
    apple_token_generator, settings,
};

fn client_for(base: &Url) -> AppleAuthClient {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let http_service = siwa_http::reqwest_service(siwa_http::reqwest_client().unwrap());
    AppleAuthClient::new(
        settings(base.as_str(), Some("name email")),
        Arc::new(apple_token_generator()),
        http_service,
    )
}

async fn init_test() -> (AppleAuthClient, MockServer) {
    let mock_server = MockServer::start().await;
    let base = Url::parse(&mock_server.uri()).expect("Couldn't parse URL");

    (client_for(&base), mock_server)
}

#[tokio::test]
async fn pass_access_token_with_authorization_code() {
    let (client, mock_server) = init_test().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(|req: &Request| {
            let query_pairs = form_urlencoded::parse(&req.body).collect::<Vec<_>>();

            if query_pairs
                .iter()
                .any(|(k, v)| k == "grant_type" && v == "authorization_code")
                && query_pairs
                    .iter()
                    .any(|(k, v)| k == "code" && v == AUTHORIZATION_CODE)
                && query_pairs
                    .iter()
                    .any(|(k, v)| k == "redirect_uri" && v == REDIRECT_URI)
                && query_pairs
                    .iter()
                    .any(|(k, v)| k == "client_id" && v == CLIENT_ID)
                && query_pairs.iter().any(|(k, v)| {
                    k == "client_assertion_type"
                        && v == "urn:ietf:params:oauth:client-assertion-type:jwt-bearer"
                })
                && query_pairs.iter().any(|(k, _)| k == "client_assertion")
            {
                true
            } else {
                println!("Wrong query pairs: {query_pairs:?}");
                false
            }
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(access_token()))
        .mount(&mock_server)
        .await;

    let token = client.access_token(AUTHORIZATION_CODE).await.unwrap();
    assert_eq!(token, access_token());
}

#[tokio::test]
async fn fail_refresh_token() {
    let (client, mock_server) = init_test().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
        )
        .mount(&mock_server)
        .await;

    let err = client.refresh_token(REFRESH_TOKEN).await.unwrap_err();
    let provider = assert_matches!(err, TokenRequestError::Provider(provider) => provider);
    assert_eq!(provider.to_string(), r#"{"error":"invalid_grant"}"#);
    assert_eq!(provider.error_body().unwrap().error, "invalid_grant");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // Grab a free port, and release it so that nothing listens there
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
    let client = client_for(&base);

    let err = client.refresh_token(REFRESH_TOKEN).await.unwrap_err();
    assert_matches!(err, TokenRequestError::Transport(_));
}
