// Copyright 2024, 2025 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! HTTP plumbing for the Sign in with Apple client.
//!
//! The client only ever talks to an [`HttpService`], a boxed, cloneable tower
//! service taking and returning buffered bodies. This crate provides:
//!
//!  - the [`HttpService`] type itself, plus [`http_service`] to adapt any
//!    streaming-body service into one,
//!  - a traced `reqwest`-backed implementation, through [`reqwest_service`],
//!  - the tower layers used to build token endpoint requests.

#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

use std::sync::LazyLock;

mod layers;
mod reqwest;
mod service;

pub use self::{
    layers::{
        body_to_bytes_response::{self, BodyToBytesResponse, BodyToBytesResponseLayer},
        bytes_to_body_request::{BytesToBodyRequest, BytesToBodyRequestLayer},
        catch_http_codes::{self, CatchHttpCodes, CatchHttpCodesLayer},
        form_urlencoded_request::{self, FormUrlencodedRequest, FormUrlencodedRequestLayer},
        json_response::{self, JsonResponse, JsonResponseLayer},
    },
    reqwest::{ClientBuildError, RequestBuilderExt, client as reqwest_client, reqwest_service},
    service::{BoxCloneSyncService, HttpService, http_service},
};

static METER: LazyLock<opentelemetry::metrics::Meter> = LazyLock::new(|| {
    let scope = opentelemetry::InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(opentelemetry_semantic_conventions::SCHEMA_URL)
        .build();

    opentelemetry::global::meter_with_scope(scope)
});
