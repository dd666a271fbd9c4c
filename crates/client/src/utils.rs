// Copyright 2025 New Vector Ltd.
// Copyright 2022-2024 Kévin Commaille.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::ops::RangeBounds;

use bytes::Bytes;
use http::{Response, StatusCode};
use url::Url;

use crate::error::ProviderError;

/// Append the given path segments to the provider base URI.
///
/// Returns `None` if the base URI cannot have a path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    url.set_fragment(None);
    Some(url)
}

pub(crate) fn provider_error_mapper(response: Response<Bytes>) -> ProviderError {
    let status = response.status();
    let body = String::from_utf8_lossy(response.body()).into_owned();
    ProviderError::new(status, body)
}

/// The status codes of a successful response. Everything else is a provider
/// error.
pub(crate) fn success_status_codes() -> impl RangeBounds<StatusCode> {
    let Ok(success_end_code) = StatusCode::from_u16(299) else {
        unreachable!()
    };

    StatusCode::OK..=success_end_code
}
