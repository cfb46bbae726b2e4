//! Session cookie storage.
//!
//! The session is stored as `base64-<base64url(json)>` under
//! `sb-<project>-auth-token`. Values longer than [`CHUNK_SIZE`] are split
//! over `<name>.0`, `<name>.1`, ... so every cookie stays under browser limits.

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite as CookieSameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use launchpad_core::auth::{
    AuthError, CookieMutation, CookieOptions, RequestCookies, SameSite, Session,
};

/// Maximum length of a single cookie value before chunking.
pub const CHUNK_SIZE: usize = 3180;

/// Session cookies are kept for 400 days; the provider decides validity.
pub const SESSION_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

const BASE64_PREFIX: &str = "base64-";

/// Encodes and decodes the session cookie set for one provider project.
#[derive(Debug, Clone)]
pub struct SessionCookieCodec {
    name: String,
    secure: bool,
}

impl SessionCookieCodec {
    pub fn new(project_ref: &str, secure: bool) -> Self {
        Self {
            name: format!("sb-{project_ref}-auth-token"),
            secure,
        }
    }

    /// Base cookie name. Chunks append `.0`, `.1`, ...
    pub fn name(&self) -> &str {
        &self.name
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{index}", self.name)
    }

    fn options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.secure,
            max_age_secs: Some(SESSION_MAX_AGE_SECS),
            ..CookieOptions::default()
        }
    }

    fn removal_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.secure,
            ..CookieOptions::default()
        }
    }

    /// Cookie writes that persist `session`, including removal of stale
    /// chunks left over from a previous, differently sized value.
    pub fn encode(&self, session: &Session, existing: &RequestCookies) -> Result<Vec<CookieMutation>, AuthError> {
        let json = serde_json::to_vec(session)
            .map_err(|e| AuthError::InvalidResponse(format!("unserialisable session: {e}")))?;
        let value = format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json));

        let mut mutations = Vec::new();

        if value.len() <= CHUNK_SIZE {
            mutations.push(CookieMutation::set(&self.name, value, self.options()));
            mutations.extend(
                self.present_chunks(existing)
                    .map(|name| CookieMutation::remove(name, self.removal_options())),
            );
            return Ok(mutations);
        }

        // The value is ASCII, so byte boundaries are char boundaries.
        let chunks: Vec<&str> = value
            .as_bytes()
            .chunks(CHUNK_SIZE)
            .filter_map(|chunk| std::str::from_utf8(chunk).ok())
            .collect();

        for (index, chunk) in chunks.iter().enumerate() {
            mutations.push(CookieMutation::set(
                self.chunk_name(index),
                *chunk,
                self.options(),
            ));
        }

        if existing.contains_key(&self.name) {
            mutations.push(CookieMutation::remove(&self.name, self.removal_options()));
        }
        mutations.extend(
            self.present_chunks(existing)
                .skip(chunks.len())
                .map(|name| CookieMutation::remove(name, self.removal_options())),
        );

        Ok(mutations)
    }

    /// Reads the session from request cookies.
    ///
    /// Returns `Ok(None)` when no session cookie is present and an error when
    /// one is present but cannot be decoded.
    pub fn decode(&self, cookies: &RequestCookies) -> Result<Option<Session>, AuthError> {
        let Some(raw) = self.raw_value(cookies) else {
            return Ok(None);
        };

        let json = match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => URL_SAFE_NO_PAD
                .decode(encoded.trim_end_matches('='))
                .map_err(|e| AuthError::InvalidResponse(format!("malformed session cookie: {e}")))?,
            None => raw.into_bytes(),
        };

        serde_json::from_slice(&json)
            .map(Some)
            .map_err(|e| AuthError::InvalidResponse(format!("malformed session cookie: {e}")))
    }

    /// Removals for every session cookie present on the request.
    pub fn clear(&self, cookies: &RequestCookies) -> Vec<CookieMutation> {
        let base = cookies
            .contains_key(&self.name)
            .then(|| self.name.clone());

        base.into_iter()
            .chain(self.present_chunks(cookies))
            .map(|name| CookieMutation::remove(name, self.removal_options()))
            .collect()
    }

    fn raw_value(&self, cookies: &RequestCookies) -> Option<String> {
        if let Some(value) = cookies.get(&self.name) {
            return Some(value.clone());
        }

        let joined: String = (0..)
            .map_while(|index| cookies.get(&self.chunk_name(index)))
            .map(String::as_str)
            .collect();

        (!joined.is_empty()).then_some(joined)
    }

    fn present_chunks<'a>(&'a self, cookies: &'a RequestCookies) -> impl Iterator<Item = String> + 'a {
        (0..)
            .map(|index| self.chunk_name(index))
            .take_while(|name| cookies.contains_key(name))
    }
}

/// Collects the cookies of a request into a name/value map.
pub fn request_cookies(jar: &CookieJar) -> RequestCookies {
    jar.iter()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}

/// Cookie map after applying `mutations`, as later request handlers should see it.
pub fn apply_mutations(cookies: &RequestCookies, mutations: &[CookieMutation]) -> RequestCookies {
    let mut merged = cookies.clone();
    for mutation in mutations {
        if mutation.is_removal() {
            merged.remove(&mutation.name);
        } else {
            merged.insert(mutation.name.clone(), mutation.value.clone());
        }
    }
    merged
}

/// Replaces the `Cookie` header so downstream handlers see `cookies`.
pub fn rewrite_cookie_header(headers: &mut HeaderMap, cookies: &RequestCookies) {
    headers.remove(header::COOKIE);

    if cookies.is_empty() {
        return;
    }

    let mut pairs: Vec<String> = cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    pairs.sort();

    if let Ok(value) = HeaderValue::from_str(&pairs.join("; ")) {
        headers.insert(header::COOKIE, value);
    }
}

/// Builds a response cookie from a mutation.
pub fn to_cookie(mutation: &CookieMutation) -> Cookie<'static> {
    let options = &mutation.options;
    let same_site = match options.same_site {
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::Strict => CookieSameSite::Strict,
        SameSite::None => CookieSameSite::None,
    };

    let mut builder = Cookie::build((mutation.name.clone(), mutation.value.clone()))
        .path(options.path.clone())
        .http_only(options.http_only)
        .secure(options.secure)
        .same_site(same_site);

    if let Some(secs) = options.max_age_secs {
        builder = builder.max_age(time::Duration::seconds(secs));
    }

    builder.build()
}

/// Appends one `Set-Cookie` header per mutation.
pub fn append_set_cookies(headers: &mut HeaderMap, mutations: &[CookieMutation]) {
    for mutation in mutations {
        match HeaderValue::from_str(&to_cookie(mutation).to_string()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(cookie = %mutation.name, error = %e, "Dropping unencodable cookie");
            }
        }
    }
}
