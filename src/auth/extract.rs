use axum::http::{header, HeaderMap};

/// Pulls a raw session token out of a request. Extractors are tried in order
/// and the first hit wins; none means the caller is anonymous.
pub trait CredentialExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, headers: &HeaderMap) -> Option<String>;
}

/// `Authorization: Bearer <token>`
pub struct BearerExtractor;

impl CredentialExtractor for BearerExtractor {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

/// Browser session cookie set by the login endpoint.
pub struct CookieExtractor {
    cookie_name: String,
}

impl CookieExtractor {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self { cookie_name: cookie_name.into() }
    }
}

impl CredentialExtractor for CookieExtractor {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn extract(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.cookie_name && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }
}

/// Default order: explicit bearer header first, then the session cookie.
pub fn default_extractors(cookie_name: &str) -> Vec<Box<dyn CredentialExtractor>> {
    vec![Box::new(BearerExtractor), Box::new(CookieExtractor::new(cookie_name))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_requires_scheme_and_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(BearerExtractor.extract(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer   xyz "));
        assert_eq!(BearerExtractor.extract(&headers).as_deref(), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(BearerExtractor.extract(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(BearerExtractor.extract(&headers), None);
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; kmci_session=tok123; lang=en"));
        assert_eq!(CookieExtractor::new("kmci_session").extract(&headers).as_deref(), Some("tok123"));
        assert_eq!(CookieExtractor::new("other").extract(&headers), None);
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        headers.insert(header::COOKIE, HeaderValue::from_static("kmci_session=cookie-token"));
        let token = default_extractors("kmci_session").iter().find_map(|e| e.extract(&headers));
        assert_eq!(token.as_deref(), Some("header-token"));
    }
}
