// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The HTTP layer underneath the client.
//!
//! Everything the client sends goes through a [`Transport`]: a fully-assembled, already-signed
//! `Request` goes in, the `hyper` response comes out. Connection pooling, TLS and timeouts are
//! the transport's business. [`HyperTransport`] is the one used by default; tests and callers with
//! their own HTTP stack can hand a different implementation to [`Twitter::with_transport`].
//!
//! [`Transport`]: trait.Transport.html
//! [`HyperTransport`]: struct.HyperTransport.html
//! [`Twitter::with_transport`]: ../struct.Twitter.html#method.with_transport

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::client::HttpConnector;
use hyper::{Body, Request};

use crate::error::{Error, Result};

#[cfg(not(any(feature = "native_tls", feature = "rustls", feature = "rustls_webpki")))]
compile_error!("Crate `fledgling` must be compiled with exactly one of the three features: \"native_tls\", \"rustls\" or \"rustls_webpki\"");

#[cfg(feature = "native_tls")]
type Connector = hyper_tls::HttpsConnector<HttpConnector>;

#[cfg(all(not(feature = "native_tls"), any(feature = "rustls", feature = "rustls_webpki")))]
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

/// Sends a request and hands back the raw response.
pub trait Transport: Send + Sync {
    /// Sends the given request.
    fn send(&self, request: Request<Body>) -> BoxFuture<'_, Result<hyper::Response<Body>>>;
}

/// The default `Transport`, a `hyper` client over HTTPS.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: hyper::Client<Connector>,
    timeout: Option<Duration>,
}

impl HyperTransport {
    /// Creates a new transport. If `timeout` is given, any request that takes longer than that to
    /// return its response headers fails with `Error::Timeout`.
    pub fn new(timeout: Option<Duration>) -> HyperTransport {
        HyperTransport {
            client: hyper::Client::builder().build(connector()),
            timeout,
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        HyperTransport::new(None)
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Body>) -> BoxFuture<'_, Result<hyper::Response<Body>>> {
        let pending = self.client.request(request);
        let timeout = self.timeout;
        async move {
            let resp = match timeout {
                Some(limit) => tokio::time::timeout(limit, pending)
                    .await
                    .map_err(|_| Error::Timeout)??,
                None => pending.await?,
            };
            log::trace!("received {}", resp.status());
            Ok(resp)
        }
        .boxed()
    }
}

#[cfg(feature = "native_tls")]
fn connector() -> Connector {
    hyper_tls::HttpsConnector::new()
}

#[cfg(all(not(feature = "native_tls"), feature = "rustls"))]
fn connector() -> Connector {
    hyper_rustls::HttpsConnector::with_native_roots()
}

#[cfg(all(not(feature = "native_tls"), not(feature = "rustls"), feature = "rustls_webpki"))]
fn connector() -> Connector {
    hyper_rustls::HttpsConnector::with_webpki_roots()
}
