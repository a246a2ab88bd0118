//! Cookie-bearing session and the two-stage login flow.
//!
//! A [`Session`] wraps a `reqwest::Client` with a cookie jar so that
//! authentication state accumulates across requests exactly like a
//! browser's. It also carries the form-driving primitive that every
//! administrative operation is built on: fetch a page, pick one form,
//! merge fields, submit.
//!
//! Callers must not issue concurrent operations against the same session;
//! there is no internal locking, and the target site assumes a
//! one-request-at-a-time browser anyway.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::form::{merge_fields, parse_forms, resolve_action, FormPredicate};

/// Where the real site lives. Tests swap this for a mock server.
pub const DEFAULT_BASE_URL: &str = "https://github.com/";

/// The login and two-factor pages, relative to the base URL.
const LOGIN_PATH: &str = "login";
const TWO_FACTOR_PATH: &str = "sessions/two-factor";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36";

/// An HTTP session whose cookie jar carries authentication state.
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

fn build_client(jar: &Arc<Jar>) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .cookie_provider(jar.clone())
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

impl Session {
    /// Create an unauthenticated session against the real site.
    pub fn new() -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = build_client(&jar)?;
        Ok(Self {
            client,
            jar,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        })
    }

    /// Point the session at a different host. Used by tests to target a
    /// mock server; the path structure stays the same.
    pub fn with_base_url(mut self, base: impl AsRef<str>) -> Result<Self> {
        let mut base = base.as_ref().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base_url = Url::parse(&base)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path (and optional query) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Drop all cookies by replacing the jar and rebuilding the client.
    ///
    /// `reqwest`'s jar has no clear operation, so a fresh login must not
    /// reuse the old jar: stale cookies would leak into the new attempt.
    pub fn reset(&mut self) -> Result<()> {
        self.jar = Arc::new(Jar::default());
        self.client = build_client(&self.jar)?;
        Ok(())
    }

    /// GET a URL, treating any error-indicating status as a failure.
    pub async fn get_checked(&self, url: Url) -> Result<Response> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RequestFailed {
                method: "GET",
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    /// The form-driving primitive.
    ///
    /// Fetches `url`, picks the first form (in document order) matching
    /// `predicate`, merges `overrides` into the form's default fields,
    /// resolves the form's `action` against `url`, and POSTs the result
    /// form-encoded. The POST response comes back for caller inspection.
    ///
    /// Fails with [`Error::FormNotFound`] before issuing any POST when the
    /// predicate matches nothing; no retries on any path.
    pub async fn drive_form(
        &self,
        url: Url,
        predicate: &FormPredicate,
        overrides: &[(String, String)],
    ) -> Result<Response> {
        info!(%url, selector = predicate.selector(), "fetching form page");
        let response = self.get_checked(url.clone()).await?;
        let body = response.text().await?;

        let form = parse_forms(&body)
            .into_iter()
            .find(|form| predicate.matches(form))
            .ok_or_else(|| Error::FormNotFound {
                url: url.to_string(),
                selector: predicate.selector().to_string(),
            })?;

        let fields = merge_fields(form.fields, overrides);
        // The action resolves against the fetch URL, not any redirect the
        // GET may have followed.
        let target = resolve_action(&url, form.action.as_deref())?;

        debug!(
            %target,
            fields = ?fields.keys().collect::<Vec<_>>(),
            "submitting form"
        );
        let response = self.client.post(target.clone()).form(&fields).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RequestFailed {
                method: "POST",
                url: target.to_string(),
                status,
            });
        }
        Ok(response)
    }

    /// Authenticate with a password and a freshly generated one-time code.
    ///
    /// Stage 1 submits the only form on the login page with the `login`
    /// and `password` fields; stage 2 submits the only form on the
    /// two-factor page with `otp`. The `code` function runs immediately
    /// before the stage-2 submission because the codes are time-sensitive.
    ///
    /// Any cookies already on this session are dropped first, so a reused
    /// session cannot carry stale authentication into a new login.
    pub async fn login<F>(&mut self, username: &str, password: &str, code: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>>,
    {
        self.reset()?;

        info!(username, "logging in");
        let overrides = [
            ("login".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        self.drive_form(self.url(LOGIN_PATH)?, &FormPredicate::any(), &overrides)
            .await?;

        let otp = code().map_err(Error::OneTimeCode)?;
        self.drive_form(
            self.url(TWO_FACTOR_PATH)?,
            &FormPredicate::any(),
            &[("otp".to_string(), otp)],
        )
        .await?;

        info!(username, "login complete");
        Ok(())
    }

}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
