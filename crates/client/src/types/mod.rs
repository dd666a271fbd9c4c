// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The types used by the client.

pub mod access_token;
pub mod client_credentials;
pub mod settings;

pub use self::{
    access_token::AccessToken,
    settings::{APPLE_PROVIDER_BASE_URI, AuthSetting, KeySetting},
};
