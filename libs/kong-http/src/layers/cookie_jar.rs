use cookie::Cookie;
use cookie::time::OffsetDateTime;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Request, Response};
use parking_lot::Mutex;
use pin_project_lite::pin_project;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tower::{Layer, Service};

/// Session cookies shared by every clone of a client.
///
/// The admin API is a single origin, so cookies are keyed by name only and
/// domain/path attributes are ignored. A cookie is dropped once it expires
/// (`Max-Age` or `Expires`) or when the server resends it with an empty value.
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    cookies: Arc<Mutex<BTreeMap<String, Cookie<'static>>>>,
}

fn is_expired(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    cookie.expires_datetime().is_some_and(|at| at <= now)
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every `Set-Cookie` header in `headers`.
    ///
    /// Unparseable headers are skipped.
    pub fn store(&self, headers: &HeaderMap) {
        let now = OffsetDateTime::now_utc();
        let mut cookies = self.cookies.lock();
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            let Ok(mut cookie) = Cookie::parse(raw.to_owned()) else {
                continue;
            };
            // `Max-Age` counts from receipt and wins over `Expires`.
            let expires_at = match cookie.max_age() {
                Some(age) => now.checked_add(age),
                None => cookie.expires_datetime(),
            };
            if cookie.value_trimmed().is_empty() || expires_at.is_some_and(|at| at <= now) {
                cookies.remove(cookie.name());
                continue;
            }
            if let Some(at) = expires_at {
                cookie.set_expires(at);
            }
            cookies.insert(cookie.name().to_owned(), cookie);
        }
    }

    /// The `Cookie` header for the current jar contents, if any.
    ///
    /// Cookies that expired since they were stored are evicted here.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        let now = OffsetDateTime::now_utc();
        let mut cookies = self.cookies.lock();
        cookies.retain(|_, cookie| !is_expired(cookie, now));
        if cookies.is_empty() {
            return None;
        }
        let joined = cookies
            .values()
            .map(|cookie| cookie.stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }

    /// Value of the stored cookie `name`, without surrounding quotes.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .lock()
            .get(name)
            .map(|cookie| cookie.value_trimmed().to_owned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.lock().is_empty()
    }

    pub fn clear(&self) {
        self.cookies.lock().clear();
    }
}

/// Tower layer that attaches a [`CookieJar`] to the wrapped service.
#[derive(Clone, Debug, Default)]
pub struct CookieJarLayer {
    jar: CookieJar,
}

impl CookieJarLayer {
    #[must_use]
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }
}

impl<S> Layer<S> for CookieJarLayer {
    type Service = CookieJarService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieJarService {
            inner,
            jar: self.jar.clone(),
        }
    }
}

/// Sends stored cookies and records new ones from each response.
///
/// A `Cookie` header set on the request itself is left untouched.
#[derive(Clone, Debug)]
pub struct CookieJarService<S> {
    inner: S,
    jar: CookieJar,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CookieJarService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = CookieFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        if !req.headers().contains_key(COOKIE)
            && let Some(value) = self.jar.header_value()
        {
            req.headers_mut().insert(COOKIE, value);
        }
        CookieFuture {
            inner: self.inner.call(req),
            jar: self.jar.clone(),
        }
    }
}

pin_project! {
    /// Response future of [`CookieJarService`].
    pub struct CookieFuture<F> {
        #[pin]
        inner: F,
        jar: CookieJar,
    }
}

impl<F, B, E> Future for CookieFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        if let Ok(response) = &result {
            this.jar.store(response.headers());
        }
        Poll::Ready(result)
    }
}
