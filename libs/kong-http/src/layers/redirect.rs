use crate::config::RedirectConfig;
use http::Uri;
use tower_http::follow_redirect::policy::{Action, Attempt, Policy};

/// Follows redirects that stay on the origin of the previous hop.
///
/// The admin token travels in a header, so a redirect to another host is never
/// followed; the 3xx response is handed back instead. An `https` -> `http` hop on
/// the same host is refused unless [`RedirectConfig::allow_https_downgrade`] is set.
#[derive(Clone, Debug)]
pub struct SameOriginRedirectPolicy {
    config: RedirectConfig,
    followed: usize,
}

impl SameOriginRedirectPolicy {
    #[must_use]
    pub fn new(config: RedirectConfig) -> Self {
        Self {
            config,
            followed: 0,
        }
    }

    fn permits(&self, previous: &Uri, target: &Uri) -> bool {
        if previous.host() != target.host() || port_of(previous) != port_of(target) {
            return false;
        }
        match (previous.scheme_str(), target.scheme_str()) {
            (Some(from), Some(to)) if from == to => true,
            (Some("http"), Some("https")) => true,
            (Some("https"), Some("http")) => self.config.allow_https_downgrade,
            _ => false,
        }
    }
}

fn port_of(uri: &Uri) -> Option<u16> {
    uri.port_u16().or(match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    })
}

impl<B: Clone, E> Policy<B, E> for SameOriginRedirectPolicy {
    fn redirect(&mut self, attempt: &Attempt<'_>) -> Result<Action, E> {
        if self.followed >= self.config.max_redirects {
            tracing::debug!(max = self.config.max_redirects, "redirect limit reached");
            return Ok(Action::Stop);
        }
        if !self.permits(attempt.previous(), attempt.location()) {
            tracing::debug!(
                from = %attempt.previous(),
                to = %attempt.location(),
                "redirect not followed: origin changed"
            );
            return Ok(Action::Stop);
        }
        self.followed += 1;
        Ok(Action::Follow)
    }

    fn clone_body(&self, body: &B) -> Option<B> {
        Some(body.clone())
    }
}
