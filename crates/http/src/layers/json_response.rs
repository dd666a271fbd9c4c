// Copyright 2024, 2025 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Deserialize JSON response bodies.

use std::{marker::PhantomData, task::Poll};

use bytes::Buf;
use futures_util::{FutureExt, future::Map};
use http::{HeaderValue, Request, Response, header::ACCEPT};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower::{Layer, Service};

/// Errors returned by [`JsonResponse`]
#[derive(Debug, Error)]
pub enum Error<Service> {
    /// The inner service failed
    #[error(transparent)]
    Service {
        /// The inner service error
        inner: Service,
    },

    /// The response body is not the expected JSON document
    #[error("could not parse JSON payload")]
    Deserialize {
        /// The deserialization error
        #[source]
        inner: serde_json::Error,
    },
}

impl<S> Error<S> {
    fn service(source: S) -> Self {
        Self::Service { inner: source }
    }

    fn deserialize(source: serde_json::Error) -> Self {
        Self::Deserialize { inner: source }
    }
}

/// A service which asks for a JSON response and deserializes its body
pub struct JsonResponse<S, T> {
    inner: S,
    _t: PhantomData<T>,
}

impl<S: Clone, T> Clone for JsonResponse<S, T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S, T> JsonResponse<S, T> {
    /// Wrap the given service
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            _t: PhantomData,
        }
    }
}

fn parse_response<T, B, E>(result: Result<Response<B>, E>) -> Result<Response<T>, Error<E>>
where
    B: Buf,
    T: DeserializeOwned,
{
    let response = result.map_err(Error::service)?;
    let (parts, body) = response.into_parts();
    let body = serde_json::from_reader(body.reader()).map_err(Error::deserialize)?;
    Ok(Response::from_parts(parts, body))
}

impl<S, T, ReqBody, ResBody> Service<Request<ReqBody>> for JsonResponse<S, T>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Buf,
    T: DeserializeOwned,
{
    type Error = Error<S::Error>;
    type Response = Response<T>;
    #[allow(clippy::type_complexity)]
    type Future = Map<
        S::Future,
        fn(Result<Response<ResBody>, S::Error>) -> Result<Self::Response, Self::Error>,
    >;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Error::service)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        self.inner.call(request).map(
            parse_response::<T, ResBody, S::Error>
                as fn(Result<Response<ResBody>, S::Error>) -> Result<Self::Response, Self::Error>,
        )
    }
}

/// A layer which wraps services in a [`JsonResponse`]
#[derive(Clone, Copy)]
pub struct JsonResponseLayer<T> {
    _t: PhantomData<T>,
}

impl<T> Default for JsonResponseLayer<T> {
    fn default() -> Self {
        Self { _t: PhantomData }
    }
}

impl<S, T> Layer<S> for JsonResponseLayer<T> {
    type Service = JsonResponse<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonResponse::new(inner)
    }
}
