// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Generation of the client assertions authenticating the client to Apple.
//!
//! See [Creating a client secret] in Apple's documentation.
//!
//! [Creating a client secret]: https://developer.apple.com/documentation/accountorganizationaldatasharing/creating-a-client-secret

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::Duration;
use siwa_jose::{
    claims,
    jwa::{AsymmetricSigningKey, AsymmetricVerifyingKey, JsonWebSignatureAlg},
    jwt::{JsonWebSignatureHeader, Jwt},
};
use siwa_keystore::PrivateKey;

use crate::{
    clock::{Clock, SystemClock},
    error::SigningError,
    types::KeySetting,
};

/// The audience of client assertions, Apple's authorization server.
pub const APPLE_AUDIENCE: &str = "https://appleid.apple.com";

/// The longest validity Apple accepts for a client assertion, in days.
pub const MAX_VALIDITY_DAYS: i64 = 180;

/// Something able to produce signed client assertions.
pub trait TokenGenerator: Send + Sync {
    /// Generate a client assertion valid for the given duration, starting now.
    ///
    /// # Errors
    ///
    /// Returns an error if the assertion could not be generated or signed.
    fn generate(&self, validity: Duration) -> Result<String, SigningError>;
}

impl<T: TokenGenerator + ?Sized> TokenGenerator for Arc<T> {
    fn generate(&self, validity: Duration) -> Result<String, SigningError> {
        (**self).generate(validity)
    }
}

/// A [`TokenGenerator`] signing assertions with a key from the Apple
/// Developer portal.
#[derive(Clone)]
pub struct AppleTokenGenerator {
    team_id: String,
    client_id: String,
    key_id: String,
    audience: String,
    signing_key: AsymmetricSigningKey,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for AppleTokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleTokenGenerator")
            .field("team_id", &self.team_id)
            .field("client_id", &self.client_id)
            .field("key_id", &self.key_id)
            .field("audience", &self.audience)
            .field("alg", &self.signing_key.algorithm())
            .finish_non_exhaustive()
    }
}

impl AppleTokenGenerator {
    /// Create a new generator for the given team and client.
    ///
    /// The key is parsed right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key of the [`KeySetting`] is not a
    /// valid P-256 or P-384 private key.
    pub fn new(
        team_id: impl Into<String>,
        client_id: impl Into<String>,
        key_setting: KeySetting,
    ) -> Result<Self, SigningError> {
        let key = PrivateKey::load(key_setting.private_key())?;

        Ok(Self {
            team_id: team_id.into(),
            client_id: client_id.into(),
            key_id: key_setting.key_id().to_owned(),
            audience: APPLE_AUDIENCE.to_owned(),
            signing_key: key.signing_key(),
            clock: Arc::new(SystemClock::default()),
        })
    }

    /// Use the given clock to get the current time.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Override the audience of the assertions.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// The algorithm used to sign assertions.
    #[must_use]
    pub fn algorithm(&self) -> JsonWebSignatureAlg {
        self.signing_key.algorithm()
    }

    /// The public key verifying the assertions.
    #[must_use]
    pub fn verifying_key(&self) -> AsymmetricVerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl TokenGenerator for AppleTokenGenerator {
    fn generate(&self, validity: Duration) -> Result<String, SigningError> {
        if validity <= Duration::zero() || validity > Duration::days(MAX_VALIDITY_DAYS) {
            return Err(SigningError::InvalidValidity { validity });
        }

        let now = self.clock.now();

        let mut claims = HashMap::new();
        claims::ISS.insert(&mut claims, &self.team_id)?;
        claims::SUB.insert(&mut claims, &self.client_id)?;
        claims::AUD.insert(&mut claims, &self.audience)?;
        claims::IAT.insert(&mut claims, now)?;
        claims::EXP.insert(&mut claims, now + validity)?;

        let header = JsonWebSignatureHeader::new(self.algorithm()).with_kid(&self.key_id);

        let jwt = Jwt::sign(header, claims, &self.signing_key)?;
        Ok(jwt.into_string())
    }
}
