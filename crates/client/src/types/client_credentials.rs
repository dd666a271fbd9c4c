// Copyright 2025 New Vector Ltd.
// Copyright 2022-2024 Kévin Commaille.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Types and methods for client credentials.

use std::fmt;

use serde::Serialize;

use crate::{error::SigningError, generator::TokenGenerator};

/// The type of client assertion sent to the token endpoint.
pub const JWT_BEARER_CLIENT_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// The credentials used to authenticate a single request to the token
/// endpoint.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_assertion: String,
}

impl ClientCredentials {
    /// Create credentials from an already generated client assertion.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_assertion: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_assertion: client_assertion.into(),
        }
    }

    /// Create credentials with a fresh client assertion.
    ///
    /// # Errors
    ///
    /// Returns an error if the assertion could not be generated.
    pub fn generate(
        client_id: impl Into<String>,
        generator: &dyn TokenGenerator,
        validity: chrono::Duration,
    ) -> Result<Self, SigningError> {
        let client_assertion = generator.generate(validity)?;
        Ok(Self::new(client_id, client_assertion))
    }

    /// The client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The signed client assertion.
    #[must_use]
    pub fn client_assertion(&self) -> &str {
        &self.client_assertion
    }

    /// Add these credentials to the form of the given request.
    pub(crate) fn apply_to_request<T: Serialize>(
        &self,
        request: http::Request<T>,
    ) -> http::Request<RequestWithClientCredentials<'_, T>> {
        request.map(|body| RequestWithClientCredentials {
            body,
            client_id: &self.client_id,
            client_assertion: &self.client_assertion,
            client_assertion_type: JwtBearerClientAssertionType,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer")]
struct JwtBearerClientAssertionType;

#[derive(Clone, Serialize)]
pub(crate) struct RequestWithClientCredentials<'a, T> {
    #[serde(flatten)]
    body: T,
    client_id: &'a str,
    client_assertion: &'a str,
    client_assertion_type: JwtBearerClientAssertionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Form {
        grant_type: &'static str,
    }

    #[test]
    fn form_carries_the_assertion() {
        let credentials = ClientCredentials::new("com.example.app", "a.b.c");
        let request = http::Request::new(Form {
            grant_type: "refresh_token",
        });

        let request = credentials.apply_to_request(request);
        let form = serde_urlencoded::to_string(request.body()).unwrap();

        assert_eq!(
            form,
            format!(
                "grant_type=refresh_token&client_id=com.example.app&client_assertion=a.b.c&client_assertion_type={}",
                "urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer"
            )
        );
        assert_eq!(
            serde_urlencoded::from_str::<Vec<(String, String)>>(&form).unwrap()[3].1,
            JWT_BEARER_CLIENT_ASSERTION_TYPE
        );

        assert!(!format!("{credentials:?}").contains("a.b.c"));
    }
}
