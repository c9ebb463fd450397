//! Session cookies for the FAQ pages.
//!
//! A session comes either from the `Set-Cookie` headers of the FAQ search
//! landing page or from a Netscape `cookies.txt` export. Either way it is
//! sent back verbatim as one `Cookie` header.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::FetchError;

/// `name=value` at the start of a `Set-Cookie` header.
static SET_COOKIE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=]+=[^;]+)").expect("valid regex"));

/// Cookie pairs to send with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pairs: Vec<String>,
}

impl Session {
    #[must_use]
    pub fn from_pairs(pairs: Vec<String>) -> Self {
        Self { pairs }
    }

    /// Collects `name=value` pairs from `Set-Cookie` header values.
    /// Headers without a pair are ignored.
    #[must_use]
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let pairs = headers
            .into_iter()
            .filter_map(|h| SET_COOKIE_PAIR.captures(h))
            .map(|c| c[1].to_owned())
            .collect();
        Self { pairs }
    }

    /// Parses a Netscape `cookies.txt`: tab-separated, name in field 6 and
    /// value in field 7. Comments, blank lines and short lines are
    /// skipped.
    #[must_use]
    pub fn from_cookies_txt(text: &str) -> Self {
        let pairs = text
            .lines()
            .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
            .filter_map(|line| {
                let parts: Vec<&str> = line.split('\t').collect();
                (parts.len() >= 7).then(|| format!("{}={}", parts[5], parts[6].trim_end()))
            })
            .collect();
        Self { pairs }
    }

    /// Reads a `cookies.txt` file.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the file cannot be read and
    /// [`FetchError::Session`] if it holds no cookies.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path).map_err(|e| FetchError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_cookies_txt(&text).require_cookies(&path.display().to_string())
    }

    /// Fails with [`FetchError::Session`] when the jar is empty.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn require_cookies(self, source: &str) -> Result<Self, FetchError> {
        if self.is_empty() {
            return Err(FetchError::Session {
                message: format!("no cookies obtained from {source}"),
            });
        }
        Ok(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Value for the `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.pairs.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_name_value_from_set_cookie() {
        let session = Session::from_set_cookie([
            "JSESSIONID=ABC123; Path=/yugiohdb; HttpOnly",
            "AWSALB=xyz; Expires=Thu, 01 Jan 2030 00:00:00 GMT",
            "=broken",
        ]);
        assert_eq!(session.len(), 2);
        assert_eq!(session.cookie_header(), "JSESSIONID=ABC123; AWSALB=xyz");
    }

    #[test]
    fn parses_netscape_cookie_file() {
        let text = "# Netscape HTTP Cookie File\n\
                    \n\
                    .db.yugioh-card.com\tTRUE\t/\tTRUE\t0\tJSESSIONID\tabc\n\
                    short\tline\n\
                    .db.yugioh-card.com\tTRUE\t/\tFALSE\t0\tCountry\tJP\r\n";
        let session = Session::from_cookies_txt(text);
        assert_eq!(session.cookie_header(), "JSESSIONID=abc; Country=JP");
    }

    #[test]
    fn empty_jar_is_rejected() {
        let session = Session::from_cookies_txt("# only comments\n");
        assert!(matches!(
            session.require_cookies("cookies.txt"),
            Err(FetchError::Session { .. })
        ));
    }

    #[test]
    fn missing_cookie_file_is_an_io_error() {
        let path = std::env::temp_dir().join("ygo_db_fetch_no_such_cookies.txt");
        assert!(matches!(Session::load(&path), Err(FetchError::Io { .. })));
    }
}
