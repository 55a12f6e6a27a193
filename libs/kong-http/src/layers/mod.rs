//! Tower layers composed by [`HttpClientBuilder`](crate::HttpClientBuilder).
//!
//! - [`DefaultHeadersLayer`] - adds `User-Agent` and configured headers when absent
//! - [`CookieJarLayer`] - stores `Set-Cookie` values and replays them
//! - [`SameOriginRedirectPolicy`] - redirect policy for `FollowRedirectLayer`

mod cookie_jar;
mod default_headers;
mod redirect;

pub use cookie_jar::{CookieJar, CookieJarLayer, CookieJarService};
pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
pub use redirect::SameOriginRedirectPolicy;
