// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A client library for [Sign in with Apple].
//!
//! It covers the three interactions a relying party has with Apple's
//! authorization server:
//!
//! - building the URI the end-user is redirected to, with
//!   [`AppleAuthClient::login_uri`],
//! - exchanging the authorization code returned to the redirect URI for
//!   tokens, with [`AppleAuthClient::access_token`],
//! - refreshing those tokens, with [`AppleAuthClient::refresh_token`].
//!
//! Apple does not issue static client secrets. Each call to the token
//! endpoint is authenticated with a short-lived ES256 JWT signed with a key
//! from the Apple Developer portal, produced by a [`TokenGenerator`].
//!
//! # Example
//!
//! ```no_run
//! # async fn run(key_pem: String) -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use siwa_client::{
//!     AppleAuthClient,
//!     generator::AppleTokenGenerator,
//!     types::settings::{AuthSetting, KeySetting},
//! };
//!
//! let settings = AuthSetting::new(
//!     "com.example.service",
//!     "https://example.com/callback",
//!     "https://appleid.apple.com",
//!     Some("name email"),
//! )?;
//! let key = KeySetting::new("KEY1234567", key_pem)?;
//! let generator = AppleTokenGenerator::new("ABCDE12345", "com.example.service", key)?;
//! let http_service = siwa_http::reqwest_service(siwa_http::reqwest_client()?);
//!
//! let client = AppleAuthClient::new(settings, Arc::new(generator), http_service);
//!
//! let login_uri = client.login_uri()?;
//! // Redirect the user to `login_uri`, then with the code posted back:
//! let tokens = client.access_token("c0de").await?;
//! # let _ = (login_uri, tokens);
//! # Ok(())
//! # }
//! ```
//!
//! [Sign in with Apple]: https://developer.apple.com/documentation/sign_in_with_apple

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod client;
pub mod clock;
pub mod error;
pub mod generator;
pub mod requests;
pub mod types;
mod utils;

pub use self::{
    client::{AppleAuthClient, AppleAuthClientBuilder},
    generator::TokenGenerator,
};

pub mod http_service {
    //! Reexports of traits to implement to provide a custom HTTP service for
    //! [`AppleAuthClient`](crate::AppleAuthClient).

    pub use siwa_http::{BoxCloneSyncService, HttpService};
}

#[doc(inline)]
pub use siwa_jose as jose;
