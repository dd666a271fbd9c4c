// Copyright 2024, 2025 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Turn responses with specific status codes into errors.

use std::{
    future::Future,
    ops::{Bound, RangeBounds},
    pin::Pin,
    task::{Context, Poll, ready},
};

use http::{Request, Response, StatusCode};
use pin_project_lite::pin_project;
use thiserror::Error;
use tower::{Layer, Service};

/// Errors returned by [`CatchHttpCodes`]
#[derive(Debug, Error)]
pub enum Error<S, E> {
    /// The inner service failed
    #[error(transparent)]
    Service {
        /// The inner service error
        inner: S,
    },

    /// The response had a status code in the caught range
    #[error("request failed with status {status_code}")]
    HttpError {
        /// The status code of the response
        status_code: StatusCode,

        /// The error produced by the mapper
        #[source]
        inner: E,
    },
}

impl<S, E> Error<S, E> {
    fn service(inner: S) -> Self {
        Self::Service { inner }
    }
}

/// The set of status codes turned into errors
#[derive(Debug, Clone, Copy)]
struct CaughtCodes {
    bounds: (Bound<StatusCode>, Bound<StatusCode>),
    outside: bool,
}

impl CaughtCodes {
    fn new<B>(bounds: &B, outside: bool) -> Self
    where
        B: RangeBounds<StatusCode>,
    {
        let bounds = (bounds.start_bound().cloned(), bounds.end_bound().cloned());
        Self { bounds, outside }
    }

    fn matches(&self, status_code: StatusCode) -> bool {
        self.bounds.contains(&status_code) != self.outside
    }
}

pin_project! {
    /// Response future of [`CatchHttpCodes`]
    pub struct CatchHttpCodesFuture<F, M> {
        #[pin]
        inner: F,
        codes: CaughtCodes,
        mapper: M,
    }
}

impl<F, M, E, ResBody, ServiceError> Future for CatchHttpCodesFuture<F, M>
where
    F: Future<Output = Result<Response<ResBody>, ServiceError>>,
    M: Fn(Response<ResBody>) -> E,
{
    type Output = Result<Response<ResBody>, Error<ServiceError, E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let response = ready!(this.inner.poll(cx)).map_err(Error::service)?;
        let status_code = response.status();

        if this.codes.matches(status_code) {
            let inner = (this.mapper)(response);
            Poll::Ready(Err(Error::HttpError { status_code, inner }))
        } else {
            Poll::Ready(Ok(response))
        }
    }
}

/// A service which maps responses with status codes in a given range (or
/// outside of it) to errors, using a mapper function
#[derive(Clone)]
pub struct CatchHttpCodes<S, M> {
    inner: S,
    codes: CaughtCodes,
    mapper: M,
}

impl<S, M, E, ReqBody, ResBody> Service<Request<ReqBody>> for CatchHttpCodes<S, M>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    M: Fn(Response<ResBody>) -> E + Clone,
{
    type Error = Error<S::Error, E>;
    type Response = Response<ResBody>;
    type Future = CatchHttpCodesFuture<S::Future, M>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Error::service)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        CatchHttpCodesFuture {
            inner: self.inner.call(request),
            codes: self.codes,
            mapper: self.mapper.clone(),
        }
    }
}

/// A layer which wraps services in a [`CatchHttpCodes`]
#[derive(Clone)]
pub struct CatchHttpCodesLayer<M> {
    codes: CaughtCodes,
    mapper: M,
}

impl<M> CatchHttpCodesLayer<M>
where
    M: Clone,
{
    /// Catch responses with a status code in the given range
    pub fn new<B>(bounds: B, mapper: M) -> Self
    where
        B: RangeBounds<StatusCode>,
    {
        let codes = CaughtCodes::new(&bounds, false);
        Self { codes, mapper }
    }

    /// Catch responses with a status code outside the given range
    pub fn except<B>(bounds: B, mapper: M) -> Self
    where
        B: RangeBounds<StatusCode>,
    {
        let codes = CaughtCodes::new(&bounds, true);
        Self { codes, mapper }
    }
}

impl<S, M> Layer<S> for CatchHttpCodesLayer<M>
where
    M: Clone,
{
    type Service = CatchHttpCodes<S, M>;

    fn layer(&self, inner: S) -> Self::Service {
        CatchHttpCodes {
            inner,
            codes: self.codes,
            mapper: self.mapper.clone(),
        }
    }
}
