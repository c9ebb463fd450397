//! `reqwest` implementation of [`PageFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};

use crate::retry::{DEFAULT_MAX_RETRIES, send_text};
use crate::session::Session;
use crate::url::Urls;
use crate::{DetailKind, FetchError, ListKind, PageFetcher};

/// Desktop browser user agent; the site serves reduced markup to unknown
/// agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client for the card database.
#[derive(Debug, Clone)]
pub struct DbClient {
    http: reqwest::Client,
    urls: Urls,
    session: Option<Session>,
    max_retries: u32,
}

impl DbClient {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(urls: Urls, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            urls,
            session: None,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Uses a pre-loaded session (e.g. from `cookies.txt`) instead of
    /// bootstrapping one.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn urls(&self) -> &Urls {
        &self.urls
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("GET {url}");
        let cookie = self.session.as_ref().map(Session::cookie_header);
        send_text(
            || {
                let request = self.http.get(url);
                match &cookie {
                    Some(c) if !c.is_empty() => request.header(COOKIE, c),
                    _ => request,
                }
            },
            self.max_retries,
        )
        .await
    }
}

#[async_trait]
impl PageFetcher for DbClient {
    async fn establish_session(&mut self) -> Result<(), FetchError> {
        if let Some(session) = &self.session
            && !session.is_empty()
        {
            log::info!("Using {} preloaded cookies", session.len());
            return Ok(());
        }

        let url = self.urls.session();
        log::info!("Establishing session via {url}");
        let response = self.http.get(&url).send().await?;
        let session = Session::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
        .require_cookies(&url)?;
        log::info!("Session established ({} cookies)", session.len());
        self.session = Some(session);
        Ok(())
    }

    async fn fetch_list_page(&self, kind: ListKind, page: u32) -> Result<String, FetchError> {
        let url = match kind {
            ListKind::Cards => self.urls.card_list(page),
            ListKind::Faq => self.urls.faq_list(page),
        };
        self.get(&url).await
    }

    async fn fetch_detail(&self, kind: DetailKind, id: &str) -> Result<String, FetchError> {
        let url = match kind {
            DetailKind::Supplement => self.urls.card_supplement(id),
            DetailKind::Faq => self.urls.faq_detail(id),
        };
        self.get(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preloaded_session_skips_bootstrap() {
        let mut client = DbClient::new(Urls::new("http://127.0.0.1:9/", "ja"), Duration::from_secs(1))
            .unwrap()
            .with_session(Session::from_pairs(vec!["JSESSIONID=abc".to_owned()]));
        client.establish_session().await.unwrap();
        assert_eq!(
            client.session.as_ref().map(Session::cookie_header).as_deref(),
            Some("JSESSIONID=abc")
        );
    }
}
