// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Loading of elliptic-curve private keys, as issued by the Apple Developer
//! portal (`AuthKey_XXXXXXXXXX.p8` files).
//!
//! Keys are accepted as PEM (`PRIVATE KEY` or `EC PRIVATE KEY`), as DER, or
//! as the bare base64 body of a `.p8` file.

#![deny(missing_docs, rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

use base64ct::{Base64, Encoding};
use elliptic_curve::pkcs8::DecodePrivateKey;
use siwa_jose::jwa::{AsymmetricSigningKey, AsymmetricVerifyingKey, JsonWebSignatureAlg};
use thiserror::Error;
use zeroize::Zeroizing;

const PEM_PREFIX: &str = "-----BEGIN";

/// Error type used when a key could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    /// The key material is empty
    #[error("the key material is empty")]
    Empty,

    /// The PEM document could not be decoded
    #[error("failed to decode PEM document")]
    Pem {
        /// The underlying error
        #[from]
        inner: pem_rfc7468::Error,
    },

    /// The bare base64 body could not be decoded
    #[error("failed to decode base64 key material")]
    Base64 {
        /// The underlying error
        #[from]
        inner: base64ct::Error,
    },

    /// The PEM document has a label we don't handle
    #[error("unsupported PEM label {label:?}")]
    UnsupportedPemLabel {
        /// The label found in the PEM document
        label: String,
    },

    /// The key is neither a P-256 nor a P-384 key, or is not an elliptic
    /// curve key at all
    #[error("unsupported key format, expected a P-256 or P-384 private key")]
    UnsupportedFormat,
}

/// A private key usable to sign client assertions
#[derive(Clone)]
#[non_exhaustive]
pub enum PrivateKey {
    /// A P-256 key, used with ES256
    EcP256(Box<p256::SecretKey>),

    /// A P-384 key, used with ES384
    EcP384(Box<p384::SecretKey>),
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EcP256(_) => f.debug_tuple("EcP256").finish_non_exhaustive(),
            Self::EcP384(_) => f.debug_tuple("EcP384").finish_non_exhaustive(),
        }
    }
}

impl PrivateKey {
    /// Load a key from its DER encoding, either PKCS#8 or SEC1.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a supported elliptic curve key.
    pub fn load_der(der: &[u8]) -> Result<Self, LoadError> {
        if der.is_empty() {
            return Err(LoadError::Empty);
        }

        if let Ok(key) = p256::SecretKey::from_pkcs8_der(der) {
            return Ok(Self::EcP256(Box::new(key)));
        }

        if let Ok(key) = p384::SecretKey::from_pkcs8_der(der) {
            return Ok(Self::EcP384(Box::new(key)));
        }

        Self::load_sec1_der(der)
    }

    fn load_sec1_der(der: &[u8]) -> Result<Self, LoadError> {
        if let Ok(key) = p256::SecretKey::from_sec1_der(der) {
            return Ok(Self::EcP256(Box::new(key)));
        }

        if let Ok(key) = p384::SecretKey::from_sec1_der(der) {
            return Ok(Self::EcP384(Box::new(key)));
        }

        Err(LoadError::UnsupportedFormat)
    }

    /// Load a key from a PEM document
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM document is invalid, or if the key is not
    /// a supported elliptic curve key.
    pub fn load_pem(pem: &str) -> Result<Self, LoadError> {
        let (label, der) = pem_rfc7468::decode_vec(pem.trim().as_bytes())?;
        let der = Zeroizing::new(der);

        match label {
            "PRIVATE KEY" => Self::load_der(&der),
            "EC PRIVATE KEY" => Self::load_sec1_der(&der),
            label => Err(LoadError::UnsupportedPemLabel {
                label: label.to_owned(),
            }),
        }
    }

    /// Load a key from a string, guessing if it is a PEM document or the bare
    /// base64 body of one.
    ///
    /// # Errors
    ///
    /// Returns an error if the key material can't be decoded or is not a
    /// supported elliptic curve key.
    pub fn load(material: &str) -> Result<Self, LoadError> {
        let material = material.trim();
        if material.is_empty() {
            return Err(LoadError::Empty);
        }

        if material.starts_with(PEM_PREFIX) {
            return Self::load_pem(material);
        }

        let body: Zeroizing<String> = Zeroizing::new(material.split_whitespace().collect());
        let der = Zeroizing::new(Base64::decode_vec(&body)?);
        Self::load_der(&der)
    }

    /// The signature algorithm this key should be used with
    #[must_use]
    pub const fn algorithm(&self) -> JsonWebSignatureAlg {
        match self {
            Self::EcP256(_) => JsonWebSignatureAlg::Es256,
            Self::EcP384(_) => JsonWebSignatureAlg::Es384,
        }
    }

    /// Get a signer for this key
    #[must_use]
    pub fn signing_key(&self) -> AsymmetricSigningKey {
        match self {
            Self::EcP256(key) => AsymmetricSigningKey::es256(*key.clone()),
            Self::EcP384(key) => AsymmetricSigningKey::es384(*key.clone()),
        }
    }

    /// Get the public key to verify signatures made with this key
    #[must_use]
    pub fn verifying_key(&self) -> AsymmetricVerifyingKey {
        self.signing_key().verifying_key()
    }
}
