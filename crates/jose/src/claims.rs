// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Typed access to the registered claims of a JWT.

use std::{collections::HashMap, convert::Infallible, marker::PhantomData};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use serde_with::{TimestampSeconds, serde_as};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("missing claim {0:?}")]
    MissingClaim(&'static str),

    #[error("claim {0:?} is already present")]
    DuplicateClaim(&'static str),

    #[error("invalid claim {0:?}")]
    InvalidClaim(&'static str),

    #[error("could not validate claim {claim:?}")]
    ValidationError {
        claim: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Checks a claim value once it has been extracted
pub trait Validator<T> {
    /// The associated error type returned by this validator.
    type Error;

    /// Validate a claim value
    ///
    /// # Errors
    ///
    /// Returns an error if the value is invalid.
    fn validate(&self, value: &T) -> Result<(), Self::Error>;
}

impl<T> Validator<T> for () {
    type Error = Infallible;

    fn validate(&self, _value: &T) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("expected {expected:?}, got {got:?}")]
pub struct EqualityError {
    expected: String,
    got: String,
}

impl Validator<String> for &str {
    type Error = EqualityError;

    fn validate(&self, value: &String) -> Result<(), Self::Error> {
        if *self == value {
            Ok(())
        } else {
            Err(EqualityError {
                expected: (*self).to_owned(),
                got: value.clone(),
            })
        }
    }
}

pub struct Claim<T> {
    claim: &'static str,
    t: PhantomData<T>,
}

impl<T> Claim<T> {
    #[must_use]
    pub const fn new(claim: &'static str) -> Self {
        Self {
            claim,
            t: PhantomData,
        }
    }

    /// The name of this claim.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.claim
    }

    /// Insert a claim into the given claims map.
    ///
    /// # Errors
    ///
    /// Returns an error if the value failed to serialize, or if the claim was
    /// already set.
    pub fn insert<I>(&self, claims: &mut HashMap<String, Value>, value: I) -> Result<(), ClaimError>
    where
        I: Into<T>,
        T: Serialize,
    {
        let value = value.into();
        let value: Value =
            serde_json::to_value(&value).map_err(|_| ClaimError::InvalidClaim(self.claim))?;

        if claims.contains_key(self.claim) {
            return Err(ClaimError::DuplicateClaim(self.claim));
        }

        claims.insert(self.claim.to_owned(), value);

        Ok(())
    }

    /// Extract a claim from the given claims map.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is missing or failed to deserialize.
    pub fn extract_required(&self, claims: &mut HashMap<String, Value>) -> Result<T, ClaimError>
    where
        T: DeserializeOwned,
    {
        self.extract_required_with_options(claims, ())
    }

    /// Extract a claim from the given claims map, and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is missing, failed to deserialize or is
    /// rejected by the validator.
    pub fn extract_required_with_options<V>(
        &self,
        claims: &mut HashMap<String, Value>,
        validator: V,
    ) -> Result<T, ClaimError>
    where
        T: DeserializeOwned,
        V: Validator<T>,
        V::Error: std::error::Error + Send + Sync + 'static,
    {
        let claim = claims
            .remove(self.claim)
            .ok_or(ClaimError::MissingClaim(self.claim))?;

        let res =
            serde_json::from_value(claim).map_err(|_| ClaimError::InvalidClaim(self.claim))?;
        validator
            .validate(&res)
            .map_err(|source| ClaimError::ValidationError {
                claim: self.claim,
                source: Box::new(source),
            })?;
        Ok(res)
    }

    /// Extract a claim from the given claims map, if it is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim failed to deserialize.
    pub fn extract_optional(
        &self,
        claims: &mut HashMap<String, Value>,
    ) -> Result<Option<T>, ClaimError>
    where
        T: DeserializeOwned,
    {
        match self.extract_required(claims) {
            Ok(v) => Ok(Some(v)),
            Err(ClaimError::MissingClaim(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A point in time, serialized as a number of seconds since the epoch.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde_as(as = "TimestampSeconds<i64>")] DateTime<Utc>);

impl std::ops::Deref for Timestamp {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp(value)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

/// The reference time to check time-based claims against.
#[derive(Debug, Clone, Copy)]
pub struct TimeOptions {
    when: DateTime<Utc>,
    leeway: Duration,
}

impl TimeOptions {
    #[must_use]
    pub fn new(when: DateTime<Utc>) -> Self {
        Self {
            when,
            leeway: Duration::minutes(5),
        }
    }

    #[must_use]
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

#[derive(Debug, Clone, Copy, Error)]
#[error("current time is too far away")]
pub struct TimeTooFarError;

/// Checks that the reference time is not after the claim (for `exp`).
#[derive(Debug, Clone, Copy)]
pub struct TimeNotAfter(TimeOptions);

impl Validator<Timestamp> for TimeNotAfter {
    type Error = TimeTooFarError;

    fn validate(&self, value: &Timestamp) -> Result<(), Self::Error> {
        if self.0.when <= value.0 + self.0.leeway {
            Ok(())
        } else {
            Err(TimeTooFarError)
        }
    }
}

impl From<TimeOptions> for TimeNotAfter {
    fn from(opt: TimeOptions) -> Self {
        Self(opt)
    }
}

impl From<&TimeOptions> for TimeNotAfter {
    fn from(opt: &TimeOptions) -> Self {
        Self(*opt)
    }
}

/// Checks that the reference time is not before the claim (for `iat` and
/// `nbf`).
#[derive(Debug, Clone, Copy)]
pub struct TimeNotBefore(TimeOptions);

impl Validator<Timestamp> for TimeNotBefore {
    type Error = TimeTooFarError;

    fn validate(&self, value: &Timestamp) -> Result<(), Self::Error> {
        if self.0.when >= value.0 - self.0.leeway {
            Ok(())
        } else {
            Err(TimeTooFarError)
        }
    }
}

impl From<TimeOptions> for TimeNotBefore {
    fn from(opt: TimeOptions) -> Self {
        Self(opt)
    }
}

impl From<&TimeOptions> for TimeNotBefore {
    fn from(opt: &TimeOptions) -> Self {
        Self(*opt)
    }
}

pub const ISS: Claim<String> = Claim::new("iss");
pub const SUB: Claim<String> = Claim::new("sub");
pub const AUD: Claim<String> = Claim::new("aud");
pub const EXP: Claim<Timestamp> = Claim::new("exp");
pub const IAT: Claim<Timestamp> = Claim::new("iat");
