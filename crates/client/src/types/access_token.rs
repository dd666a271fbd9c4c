// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The response of the token endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A successful response from the token endpoint.
///
/// The provider sends `snake_case` fields; the `camelCase` form is what this
/// type serializes to, and both are accepted when deserializing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// The access token.
    #[serde(alias = "access_token")]
    pub access_token: String,

    /// The refresh token, only returned when exchanging an authorization
    /// code.
    #[serde(
        default,
        alias = "refresh_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,

    /// The signed ID token of the user.
    #[serde(default, alias = "id_token", skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// The type of the access token, always `Bearer`.
    #[serde(alias = "token_type")]
    pub token_type: String,

    /// The lifetime of the access token, in seconds.
    #[serde(alias = "expires_in")]
    pub expires_in: i64,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}
