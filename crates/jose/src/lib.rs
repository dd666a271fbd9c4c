// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Minimal JSON Web Signature support, scoped to what is needed to produce
//! and check the ES256/ES384 client assertions used by Sign in with Apple.

#![deny(rustdoc::broken_intra_doc_links)]
#![allow(clippy::module_name_repetitions)]

pub mod claims;
pub mod jwa;
pub mod jwt;
