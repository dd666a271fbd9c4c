// Copyright (C) 2024 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use bytes::Bytes;
use http::Request;
use http_body_util::Full;
use tower::{Layer, Service};

/// A service which turns buffered request bodies into [`Full`] bodies for the
/// inner service
#[derive(Clone)]
pub struct BytesToBodyRequest<S> {
    inner: S,
}

impl<S> BytesToBodyRequest<S> {
    /// Wrap the given service
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Service<Request<Bytes>> for BytesToBodyRequest<S>
where
    S: Service<Request<Full<Bytes>>>,
{
    type Error = S::Error;
    type Response = S::Response;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.inner.call(request.map(Full::new))
    }
}

/// A layer which wraps services in a [`BytesToBodyRequest`]
#[derive(Default, Clone, Copy)]
pub struct BytesToBodyRequestLayer;

impl<S> Layer<S> for BytesToBodyRequestLayer {
    type Service = BytesToBodyRequest<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BytesToBodyRequest::new(inner)
    }
}
