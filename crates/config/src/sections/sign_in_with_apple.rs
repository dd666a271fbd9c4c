// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{borrow::Cow, sync::Arc};

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use siwa_client::{
    AppleAuthClient,
    generator::AppleTokenGenerator,
    http_service::HttpService,
    types::{APPLE_PROVIDER_BASE_URI, AuthSetting, KeySetting},
};
use url::Url;

use super::ConfigurationSection;
use crate::util::annotate_error;

/// The private key downloaded from the Apple Developer portal.
///
/// It either holds the PEM-encoded key directly or references the `.p8` file
/// where it is stored.
#[derive(Clone)]
pub enum PrivateKeyConfig {
    /// Path to the key file
    File(Utf8PathBuf),

    /// The key itself
    Value(String),
}

impl std::fmt::Debug for PrivateKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Value(_) => f.debug_tuple("Value").field(&"[redacted]").finish(),
        }
    }
}

/// Key fields as serialized in the configuration.
#[derive(JsonSchema, Serialize, Deserialize, Clone, Debug)]
struct PrivateKeyRaw {
    /// Path to the `.p8` file of the key
    #[schemars(with = "Option<String>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key_file: Option<Utf8PathBuf>,

    /// The PEM-encoded key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
}

impl TryFrom<PrivateKeyRaw> for PrivateKeyConfig {
    type Error = anyhow::Error;

    fn try_from(value: PrivateKeyRaw) -> Result<Self, Self::Error> {
        match (value.private_key, value.private_key_file) {
            (None, None) => bail!("Missing `private_key` or `private_key_file`"),
            (None, Some(path)) => Ok(Self::File(path)),
            (Some(key), None) => Ok(Self::Value(key)),
            (Some(_), Some(_)) => {
                bail!("Cannot specify both `private_key` and `private_key_file`")
            }
        }
    }
}

impl From<PrivateKeyConfig> for PrivateKeyRaw {
    fn from(value: PrivateKeyConfig) -> Self {
        match value {
            PrivateKeyConfig::File(path) => Self {
                private_key_file: Some(path),
                private_key: None,
            },
            PrivateKeyConfig::Value(key) => Self {
                private_key_file: None,
                private_key: Some(key),
            },
        }
    }
}

impl PrivateKeyConfig {
    /// Returns the PEM-encoded key.
    ///
    /// If a file was given, the key is read from that file.
    async fn pem(&self) -> anyhow::Result<Cow<'_, str>> {
        Ok(match self {
            Self::File(path) => Cow::Owned(
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read the private key from {path}"))?,
            ),
            Self::Value(key) => Cow::Borrowed(key),
        })
    }
}

/// Configuration of the Sign in with Apple client
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SignInWithAppleConfig {
    /// The Services ID registered in the Apple Developer portal
    pub client_id: String,

    /// The URI Apple posts the authorization response to. It is sent exactly
    /// as written here, and must match the one registered with Apple
    #[schemars(url)]
    pub redirect_uri: String,

    /// Base URI of Apple's authorization server. Defaults to
    /// `https://appleid.apple.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_base_uri: Option<Url>,

    /// Space-separated scopes to request, like `name email`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// The Team ID of the Apple Developer account
    pub team_id: String,

    /// The ID of the private key
    pub key_id: String,

    /// The private key signing the client assertions
    #[schemars(with = "PrivateKeyRaw")]
    #[serde_as(as = "serde_with::TryFromInto<PrivateKeyRaw>")]
    #[serde(flatten)]
    pub private_key: PrivateKeyConfig,
}

impl ConfigurationSection for SignInWithAppleConfig {
    const PATH: Option<&'static str> = Some("sign_in_with_apple");

    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let path = Self::PATH.unwrap_or_default();

        for (field, value) in [
            ("client_id", &self.client_id),
            ("team_id", &self.team_id),
            ("key_id", &self.key_id),
        ] {
            if value.trim().is_empty() {
                let message = format!("`{field}` must not be empty");
                return Err(annotate_error(figment, path, message).into());
            }
        }

        let Ok(redirect_uri) = Url::parse(&self.redirect_uri) else {
            let message = "`redirect_uri` is not a valid URL";
            return Err(annotate_error(figment, path, message).into());
        };

        let urls = [
            ("redirect_uri", Some(&redirect_uri)),
            ("provider_base_uri", self.provider_base_uri.as_ref()),
        ];
        for (field, url) in urls {
            let Some(url) = url else { continue };
            if !matches!(url.scheme(), "http" | "https") {
                return Err(annotate_error(
                    figment,
                    path,
                    format!("`{field}` must be an http or https URL"),
                )
                .into());
            }
        }

        Ok(())
    }
}

impl SignInWithAppleConfig {
    /// Base URI of Apple's authorization server, falling back to the
    /// production one.
    #[must_use]
    pub fn provider_base_uri(&self) -> &str {
        self.provider_base_uri
            .as_ref()
            .map_or(APPLE_PROVIDER_BASE_URI, Url::as_str)
    }

    /// Build the [`AuthSetting`] of the client.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the values is rejected by [`AuthSetting`].
    pub fn auth_setting(&self) -> anyhow::Result<AuthSetting> {
        let setting = AuthSetting::new(
            self.client_id.clone(),
            &self.redirect_uri,
            self.provider_base_uri(),
            self.scope.as_deref(),
        )?;
        Ok(setting)
    }

    /// Build the [`KeySetting`] of the client, reading the key file if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key file could not be read.
    pub async fn key_setting(&self) -> anyhow::Result<KeySetting> {
        let pem = self.private_key.pem().await?;
        let setting = KeySetting::new(self.key_id.clone(), pem.into_owned())?;
        Ok(setting)
    }

    /// Build the generator of client assertions.
    ///
    /// # Errors
    ///
    /// Returns an error if the key could not be read or parsed.
    pub async fn token_generator(&self) -> anyhow::Result<AppleTokenGenerator> {
        let key_setting = self.key_setting().await?;
        let generator =
            AppleTokenGenerator::new(self.team_id.clone(), self.client_id.clone(), key_setting)
                .context("Invalid Sign in with Apple private key")?;
        Ok(generator)
    }

    /// Build a client using the given HTTP service.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, or if the key could not be
    /// read or parsed.
    pub async fn client(&self, http_service: HttpService) -> anyhow::Result<AppleAuthClient> {
        let settings = self.auth_setting()?;
        let token_generator = self.token_generator().await?;

        let client = AppleAuthClient::builder()
            .settings(settings)
            .token_generator(Arc::new(token_generator))
            .http_service(http_service)
            .build()?;
        Ok(client)
    }
}
