// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::fmt;

use serde::{Deserialize, Serialize};

mod asymmetric;
mod signature;

pub use self::{
    asymmetric::{AsymmetricSigningKey, AsymmetricVerifyingKey},
    signature::Signature,
};

pub type Es256SigningKey = ecdsa::SigningKey<p256::NistP256>;
pub type Es256VerifyingKey = ecdsa::VerifyingKey<p256::NistP256>;
pub type Es384SigningKey = ecdsa::SigningKey<p384::NistP384>;
pub type Es384VerifyingKey = ecdsa::VerifyingKey<p384::NistP384>;

/// JSON Web Signature algorithms supported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonWebSignatureAlg {
    /// ECDSA using P-256 and SHA-256
    #[serde(rename = "ES256")]
    Es256,

    /// ECDSA using P-384 and SHA-384
    #[serde(rename = "ES384")]
    Es384,
}

impl JsonWebSignatureAlg {
    /// The name of the algorithm, as found in the `alg` header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
        }
    }
}

impl fmt::Display for JsonWebSignatureAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

