// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{collections::HashMap, sync::Arc, time::Duration};

use assert_matches::assert_matches;
use bytes::Bytes;
use http::{Request, Response, StatusCode, header};
use serde_json::Value;
use siwa_client::{
    AppleAuthClient,
    error::TokenRequestError,
    http_service::HttpService,
    jose::{claims, jwt::Jwt},
};
use tokio_util::sync::CancellationToken;
use tower::{BoxError, service_fn};

use crate::{
    AUTHORIZATION_CODE, CLIENT_ASSERTION, CLIENT_ID, REDIRECT_URI, REFRESH_TOKEN, TEAM_ID,
    access_token, apple_token_generator, client_with, settings, stub_service,
};

#[tokio::test]
async fn access_token_success() {
    let expected = access_token();
    let body = serde_json::to_vec(&expected).unwrap();
    let (http_service, requests) = stub_service(StatusCode::OK, body);
    let client = client_with(http_service);

    let token = client.access_token(AUTHORIZATION_CODE).await.unwrap();
    assert_eq!(token, expected);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(request.method, http::Method::POST);
    assert_eq!(request.uri, "https://appleid.apple.com/auth/token");
    assert_eq!(
        request.headers[header::CONTENT_TYPE],
        "application/x-www-form-urlencoded"
    );
    assert_eq!(request.headers[header::ACCEPT], "application/json");

    let expected_form: HashMap<String, String> = [
        ("grant_type", "authorization_code"),
        ("code", AUTHORIZATION_CODE),
        ("redirect_uri", REDIRECT_URI),
        ("client_id", CLIENT_ID),
        ("client_assertion", CLIENT_ASSERTION),
        (
            "client_assertion_type",
            "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();
    assert_eq!(request.form, expected_form);
}

#[tokio::test]
async fn refresh_token_success() {
    let expected = access_token();
    let body = serde_json::to_vec(&expected).unwrap();
    let (http_service, requests) = stub_service(StatusCode::OK, body);
    let client = client_with(http_service);

    let token = client.refresh_token(REFRESH_TOKEN).await.unwrap();
    assert_eq!(token, expected);

    let requests = requests.lock().unwrap();
    let form = &requests[0].form;
    assert_eq!(form.len(), 5);
    assert_eq!(form["grant_type"], "refresh_token");
    assert_eq!(form["refresh_token"], REFRESH_TOKEN);
    assert_eq!(form["client_id"], CLIENT_ID);
    assert_eq!(form["client_assertion"], CLIENT_ASSERTION);
    assert!(!form.contains_key("code"));
    assert!(!form.contains_key("redirect_uri"));
}

#[tokio::test]
async fn provider_snake_case_response() {
    let body = r#"{
        "access_token": "AccessToken1",
        "expires_in": 3600,
        "id_token": "eyJraWQiOiJZdXlYb1kifQ.eyJpc3MiOiJhcHBsZSJ9.c2ln",
        "refresh_token": "r3fresh",
        "token_type": "Bearer"
    }"#;
    let (http_service, _) = stub_service(StatusCode::OK, body);
    let client = client_with(http_service);

    let token = client.access_token(AUTHORIZATION_CODE).await.unwrap();
    assert_eq!(token, access_token());
}

#[tokio::test]
async fn camel_case_round_trip() {
    let mut original = access_token();
    original.refresh_token = None;
    original.id_token = None;

    let body = serde_json::to_string(&original).unwrap();
    assert!(body.contains("\"accessToken\""));

    let (http_service, _) = stub_service(StatusCode::OK, body);
    let client = client_with(http_service);

    let token = client.refresh_token(REFRESH_TOKEN).await.unwrap();
    assert_eq!(token, original);
}

#[tokio::test]
async fn provider_error_is_raw_body() {
    let (http_service, _) = stub_service(StatusCode::BAD_REQUEST, "error");
    let client = client_with(http_service);

    let err = client.access_token(AUTHORIZATION_CODE).await.unwrap_err();
    assert_matches!(&err, TokenRequestError::Provider(provider) => {
        assert_eq!(provider.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.to_string(), "error");
    });
    assert_eq!(err.to_string(), "error");

    let err = client.refresh_token(REFRESH_TOKEN).await.unwrap_err();
    assert_matches!(&err, TokenRequestError::Provider(provider) => {
        assert_eq!(provider.to_string(), "error");
    });
}

#[tokio::test]
async fn provider_error_body_is_parseable() {
    let body = r#"{"error":"invalid_grant"}"#;
    let (http_service, _) = stub_service(StatusCode::BAD_REQUEST, body);
    let client = client_with(http_service);

    let err = client.access_token(AUTHORIZATION_CODE).await.unwrap_err();
    let provider = assert_matches!(err, TokenRequestError::Provider(provider) => provider);
    assert_eq!(provider.to_string(), body);
    assert_eq!(provider.error_body().unwrap().error, "invalid_grant");
}

#[tokio::test]
async fn server_error_is_provider_error() {
    let (http_service, _) = stub_service(StatusCode::SERVICE_UNAVAILABLE, "down");
    let client = client_with(http_service);

    let err = client.refresh_token(REFRESH_TOKEN).await.unwrap_err();
    assert_matches!(err, TokenRequestError::Provider(provider) if provider.status() == StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn nonstandard_status_is_provider_error() {
    let status = StatusCode::from_u16(600).unwrap();
    let (http_service, _) = stub_service(status, "odd");
    let client = client_with(http_service);

    let err = client.refresh_token(REFRESH_TOKEN).await.unwrap_err();
    assert_matches!(err, TokenRequestError::Provider(provider) if provider.status() == status && provider.body() == "odd");
}

#[tokio::test]
async fn invalid_json_is_decode_error() {
    let (http_service, _) = stub_service(StatusCode::OK, "not json");
    let client = client_with(http_service);

    let err = client.access_token(AUTHORIZATION_CODE).await.unwrap_err();
    assert_matches!(err, TokenRequestError::Decode(_));
}

#[tokio::test]
async fn transport_error_is_not_provider_error() {
    let service = service_fn(|_request: Request<Bytes>| async {
        Err::<Response<Bytes>, BoxError>("connection reset by peer".into())
    });
    let client = client_with(HttpService::new(service));

    let err = client.access_token(AUTHORIZATION_CODE).await.unwrap_err();
    assert_matches!(err, TokenRequestError::Transport(inner) => {
        assert_eq!(inner.to_string(), "connection reset by peer");
    });
}

#[tokio::test]
async fn cancellation() {
    let service = service_fn(|_request: Request<Bytes>| async {
        std::future::pending::<()>().await;
        Ok::<_, BoxError>(Response::new(Bytes::new()))
    });
    let client = client_with(HttpService::new(service));

    let token = CancellationToken::new();
    token.cancel();

    let err = client
        .access_token_cancellable(AUTHORIZATION_CODE, &token)
        .await
        .unwrap_err();
    assert_matches!(err, TokenRequestError::Cancelled);

    let err = client
        .refresh_token_cancellable(REFRESH_TOKEN, &token)
        .await
        .unwrap_err();
    assert_matches!(err, TokenRequestError::Cancelled);
}

#[tokio::test]
async fn not_cancelled_completes() {
    let body = serde_json::to_vec(&access_token()).unwrap();
    let (http_service, _) = stub_service(StatusCode::OK, body);
    let client = client_with(http_service);

    let token = CancellationToken::new();
    let res = client
        .refresh_token_cancellable(REFRESH_TOKEN, &token)
        .await
        .unwrap();
    assert_eq!(res, access_token());
}

#[tokio::test(start_paused = true)]
async fn timeout() {
    let service = service_fn(|_request: Request<Bytes>| async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok::<_, BoxError>(Response::new(Bytes::new()))
    });

    let client = AppleAuthClient::builder()
        .settings(settings("https://appleid.apple.com", None))
        .token_generator(Arc::new(crate::StaticTokenGenerator))
        .http_service(HttpService::new(service))
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let err = client.access_token(AUTHORIZATION_CODE).await.unwrap_err();
    assert_matches!(err, TokenRequestError::Timeout);
}

#[tokio::test]
async fn signing_error_is_surfaced() {
    let body = serde_json::to_vec(&access_token()).unwrap();
    let (http_service, requests) = stub_service(StatusCode::OK, body);

    let client = AppleAuthClient::builder()
        .settings(settings("https://appleid.apple.com", None))
        .token_generator(Arc::new(apple_token_generator()))
        .http_service(http_service)
        .assertion_validity(chrono::Duration::days(365))
        .build()
        .unwrap();

    let err = client.access_token(AUTHORIZATION_CODE).await.unwrap_err();
    assert_matches!(
        err,
        TokenRequestError::Credentials(siwa_client::error::SigningError::InvalidValidity { .. })
    );

    // Nothing was sent
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fresh_signed_assertion_per_request() {
    let body = serde_json::to_vec(&access_token()).unwrap();
    let (http_service, requests) = stub_service(StatusCode::OK, body);

    let generator = apple_token_generator();
    let verifying_key = generator.verifying_key();

    let client = AppleAuthClient::new(
        settings("https://appleid.apple.com", None),
        Arc::new(generator),
        http_service,
    );

    client.access_token(AUTHORIZATION_CODE).await.unwrap();
    client.refresh_token(REFRESH_TOKEN).await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);

    for request in requests.iter() {
        let assertion = request.form["client_assertion"].clone();
        let jwt: Jwt<HashMap<String, Value>> = Jwt::try_from(assertion).unwrap();
        jwt.verify(&verifying_key).unwrap();
        assert_eq!(jwt.header().kid(), Some(crate::KEY_ID));

        let (_, mut claims) = jwt.into_parts();
        assert_eq!(claims::ISS.extract_required(&mut claims).unwrap(), TEAM_ID);
        assert_eq!(claims::SUB.extract_required(&mut claims).unwrap(), CLIENT_ID);
        assert_eq!(
            claims::AUD.extract_required(&mut claims).unwrap(),
            "https://appleid.apple.com"
        );

        let iat = claims::IAT.extract_required(&mut claims).unwrap();
        let exp = claims::EXP.extract_required(&mut claims).unwrap();
        assert_eq!(*exp - *iat, chrono::Duration::minutes(5));
    }
}

#[tokio::test]
async fn redirect_uri_is_sent_verbatim() {
    let body = serde_json::to_vec(&access_token()).unwrap();
    let (http_service, requests) = stub_service(StatusCode::OK, body);

    let settings = siwa_client::types::AuthSetting::new(
        CLIENT_ID,
        "https://apple.com",
        "https://apple.com",
        None,
    )
    .unwrap();
    let client = AppleAuthClient::new(
        settings,
        Arc::new(crate::StaticTokenGenerator),
        http_service,
    );

    client.access_token(AUTHORIZATION_CODE).await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].form["redirect_uri"], "https://apple.com");
    assert_eq!(requests[0].uri, "https://apple.com/auth/token");
}

#[tokio::test]
async fn token_endpoint_follows_base_uri() {
    let body = serde_json::to_vec(&access_token()).unwrap();
    let (http_service, requests) = stub_service(StatusCode::OK, body);

    let client = AppleAuthClient::new(
        settings("http://localhost:8080/apple/", None),
        Arc::new(crate::StaticTokenGenerator),
        http_service,
    );

    client.refresh_token(REFRESH_TOKEN).await.unwrap();
    assert_eq!(
        requests.lock().unwrap()[0].uri,
        "http://localhost:8080/apple/auth/token"
    );
}
