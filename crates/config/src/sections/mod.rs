// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod sign_in_with_apple;

pub use self::sign_in_with_apple::{PrivateKeyConfig, SignInWithAppleConfig};
use crate::util::ConfigurationSection;

/// Application configuration root
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// Configuration of the Sign in with Apple client
    pub sign_in_with_apple: SignInWithAppleConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.sign_in_with_apple.validate(figment)?;
        Ok(())
    }
}
