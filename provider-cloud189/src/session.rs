//! Per-account cookie session.
//!
//! 189 Cloud authenticates every API call with cookies set during the login
//! redirect chain. The jar keeps them per cookie domain; it is deliberately
//! small: no paths, no expiry dates, and an empty value deletes a cookie.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cookie {
    name: String,
    value: String,
    domain: String,
}

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one `Set-Cookie` value received from `origin`.
    pub fn store(&mut self, origin: &Url, set_cookie: &str) {
        let mut parts = set_cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim().to_string();
        let value = value.trim().to_string();

        let mut domain = origin.host_str().unwrap_or_default().to_ascii_lowercase();
        let mut expired = value.is_empty();
        for attribute in parts {
            let (key, val) = attribute.split_once('=').unwrap_or((attribute, ""));
            match key.trim().to_ascii_lowercase().as_str() {
                "domain" if !val.trim().is_empty() => {
                    domain = val.trim().trim_start_matches('.').to_ascii_lowercase();
                }
                "max-age" if val.trim().starts_with('-') || val.trim() == "0" => expired = true,
                _ => {}
            }
        }

        self.cookies
            .retain(|c| !(c.name == name && c.domain == domain));
        if !expired {
            self.cookies.push(Cookie {
                name,
                value,
                domain,
            });
        }
    }

    pub fn store_all<'a>(&mut self, origin: &Url, set_cookies: impl Iterator<Item = &'a str>) {
        for set_cookie in set_cookies {
            self.store(origin, set_cookie);
        }
    }

    /// `Cookie` header value for a request to `url`.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?.to_ascii_lowercase();
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| host == c.domain || host.ends_with(&format!(".{}", c.domain)))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
