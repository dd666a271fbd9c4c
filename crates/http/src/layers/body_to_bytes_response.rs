// Copyright (C) 2024 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Collect streaming response bodies in memory.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{Request, Response};
use http_body::Body;
use http_body_util::BodyExt;
use thiserror::Error;
use tower::{BoxError, Layer, Service};

/// Errors returned by [`BodyToBytesResponse`]
#[derive(Debug, Error)]
pub enum Error<ServiceError, BodyError> {
    /// The inner service failed
    #[error(transparent)]
    Service {
        /// The inner service error
        inner: ServiceError,
    },

    /// Reading the response body failed
    #[error(transparent)]
    Body {
        /// The body error
        inner: BodyError,
    },
}

impl<S, B> Error<S, B> {
    fn service(inner: S) -> Self {
        Self::Service { inner }
    }

    fn body(inner: B) -> Self {
        Self::Body { inner }
    }
}

impl<S, B> Error<S, B>
where
    S: Into<BoxError>,
    B: Into<BoxError>,
{
    /// Erase the error type, keeping the underlying error
    pub fn into_box_error(self) -> BoxError {
        match self {
            Self::Service { inner } => inner.into(),
            Self::Body { inner } => inner.into(),
        }
    }
}

/// A service which buffers the whole response body of the inner service
#[derive(Clone)]
pub struct BodyToBytesResponse<S> {
    inner: S,
}

impl<S> BodyToBytesResponse<S> {
    /// Wrap the given service
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for BodyToBytesResponse<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
{
    type Error = Error<S::Error, ResBody::Error>;
    type Response = Response<Bytes>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Error::service)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let inner = self.inner.call(request);

        let fut = async {
            let response = inner.await.map_err(Error::service)?;
            let (parts, body) = response.into_parts();

            let body = body.collect().await.map_err(Error::body)?.to_bytes();

            Ok(Response::from_parts(parts, body))
        };

        Box::pin(fut)
    }
}

/// A layer which wraps services in a [`BodyToBytesResponse`]
#[derive(Default, Clone, Copy)]
pub struct BodyToBytesResponseLayer;

impl<S> Layer<S> for BodyToBytesResponseLayer {
    type Service = BodyToBytesResponse<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BodyToBytesResponse::new(inner)
    }
}
