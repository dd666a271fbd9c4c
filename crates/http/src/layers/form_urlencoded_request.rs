// Copyright 2024, 2025 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Serialize request bodies as `application/x-www-form-urlencoded`.

use std::{future::Ready, marker::PhantomData, task::Poll};

use bytes::Bytes;
use futures_util::{
    FutureExt, TryFutureExt,
    future::{Either, MapErr},
};
use headers::{ContentType, HeaderMapExt};
use http::Request;
use serde::Serialize;
use thiserror::Error;
use tower::{Layer, Service};

/// Errors returned by [`FormUrlencodedRequest`]
#[derive(Debug, Error)]
pub enum Error<Service> {
    /// The inner service failed
    #[error(transparent)]
    Service {
        /// The inner service error
        inner: Service,
    },

    /// The request body could not be serialized
    #[error("could not serialize form payload")]
    Serialize {
        /// The serialization error
        #[source]
        inner: serde_urlencoded::ser::Error,
    },
}

impl<S> Error<S> {
    fn service(source: S) -> Self {
        Self::Service { inner: source }
    }

    fn serialize(source: serde_urlencoded::ser::Error) -> Self {
        Self::Serialize { inner: source }
    }
}

/// A service which serializes the request body as a form
pub struct FormUrlencodedRequest<S, T> {
    inner: S,
    _t: PhantomData<T>,
}

impl<S: Clone, T> Clone for FormUrlencodedRequest<S, T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S, T> FormUrlencodedRequest<S, T> {
    /// Wrap the given service
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            _t: PhantomData,
        }
    }
}

impl<S, T> Service<Request<T>> for FormUrlencodedRequest<S, T>
where
    S: Service<Request<Bytes>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    T: Serialize,
{
    type Error = Error<S::Error>;
    type Response = S::Response;
    type Future = Either<
        Ready<Result<Self::Response, Self::Error>>,
        MapErr<S::Future, fn(S::Error) -> Self::Error>,
    >;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Error::service)
    }

    fn call(&mut self, request: Request<T>) -> Self::Future {
        let (mut parts, body) = request.into_parts();

        parts.headers.typed_insert(ContentType::form_url_encoded());

        let body = match serde_urlencoded::to_string(&body) {
            Ok(body) => Bytes::from(body),
            Err(err) => return std::future::ready(Err(Error::serialize(err))).left_future(),
        };

        let request = Request::from_parts(parts, body);

        self.inner
            .call(request)
            .map_err(Error::service as fn(S::Error) -> Self::Error)
            .right_future()
    }
}

/// A layer which wraps services in a [`FormUrlencodedRequest`]
#[derive(Clone, Copy)]
pub struct FormUrlencodedRequestLayer<T> {
    _t: PhantomData<T>,
}

impl<T> Default for FormUrlencodedRequestLayer<T> {
    fn default() -> Self {
        Self { _t: PhantomData }
    }
}

impl<S, T> Layer<S> for FormUrlencodedRequestLayer<T> {
    type Service = FormUrlencodedRequest<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        FormUrlencodedRequest::new(inner)
    }
}
