// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::fmt;

use signature::{Signer, Verifier};

use super::{
    Es256SigningKey, Es256VerifyingKey, Es384SigningKey, Es384VerifyingKey, JsonWebSignatureAlg,
    signature::Signature,
};

/// An asymmetric key able to sign JWTs
#[derive(Clone)]
#[non_exhaustive]
pub enum AsymmetricSigningKey {
    Es256(Es256SigningKey),
    Es384(Es384SigningKey),
}

impl AsymmetricSigningKey {
    /// Create a new signing key with the ES256 algorithm from the given
    /// P-256 secret key
    #[must_use]
    pub fn es256(key: elliptic_curve::SecretKey<p256::NistP256>) -> Self {
        Self::Es256(key.into())
    }

    /// Create a new signing key with the ES384 algorithm from the given
    /// P-384 secret key
    #[must_use]
    pub fn es384(key: elliptic_curve::SecretKey<p384::NistP384>) -> Self {
        Self::Es384(key.into())
    }

    /// The algorithm this key signs with
    #[must_use]
    pub const fn algorithm(&self) -> JsonWebSignatureAlg {
        match self {
            Self::Es256(_) => JsonWebSignatureAlg::Es256,
            Self::Es384(_) => JsonWebSignatureAlg::Es384,
        }
    }

    /// Get the public counterpart of this key
    #[must_use]
    pub fn verifying_key(&self) -> AsymmetricVerifyingKey {
        match self {
            Self::Es256(key) => AsymmetricVerifyingKey::Es256(*key.verifying_key()),
            Self::Es384(key) => AsymmetricVerifyingKey::Es384(*key.verifying_key()),
        }
    }
}

impl fmt::Debug for AsymmetricSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricSigningKey")
            .field("alg", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl From<Es256SigningKey> for AsymmetricSigningKey {
    fn from(key: Es256SigningKey) -> Self {
        Self::Es256(key)
    }
}

impl From<Es384SigningKey> for AsymmetricSigningKey {
    fn from(key: Es384SigningKey) -> Self {
        Self::Es384(key)
    }
}

impl Signer<Signature> for AsymmetricSigningKey {
    fn try_sign(&self, msg: &[u8]) -> Result<Signature, signature::Error> {
        match self {
            Self::Es256(key) => {
                let signature: ecdsa::Signature<p256::NistP256> = key.try_sign(msg)?;
                Ok(Signature::from_signature(&signature))
            }
            Self::Es384(key) => {
                let signature: ecdsa::Signature<p384::NistP384> = key.try_sign(msg)?;
                Ok(Signature::from_signature(&signature))
            }
        }
    }
}

/// An asymmetric key able to verify JWT signatures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AsymmetricVerifyingKey {
    Es256(Es256VerifyingKey),
    Es384(Es384VerifyingKey),
}

impl AsymmetricVerifyingKey {
    /// The algorithm this key verifies
    #[must_use]
    pub const fn algorithm(&self) -> JsonWebSignatureAlg {
        match self {
            Self::Es256(_) => JsonWebSignatureAlg::Es256,
            Self::Es384(_) => JsonWebSignatureAlg::Es384,
        }
    }
}

impl Verifier<Signature> for AsymmetricVerifyingKey {
    fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), signature::Error> {
        match self {
            Self::Es256(key) => {
                let signature: ecdsa::Signature<p256::NistP256> = signature.to_signature()?;
                key.verify(msg, &signature)
            }
            Self::Es384(key) => {
                let signature: ecdsa::Signature<p384::NistP384> = signature.to_signature()?;
                key.verify(msg, &signature)
            }
        }
    }
}
