//! URL builders for the card database's search actions.

/// Site root every action hangs off.
pub const DEFAULT_BASE_URL: &str = "https://www.db.yugioh-card.com/yugiohdb/";

pub const DEFAULT_LOCALE: &str = "ja";

/// Builds request URLs against a base and locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Urls {
    base: String,
    locale: String,
}

impl Default for Urls {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_LOCALE)
    }
}

impl Urls {
    /// A trailing slash is added to `base` when missing.
    #[must_use]
    pub fn new(base: &str, locale: &str) -> Self {
        let mut base = base.to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            base,
            locale: locale.to_owned(),
        }
    }

    #[must_use]
    pub fn card_list(&self, page: u32) -> String {
        format!(
            "{}card_search.action?ope=1&sess=1&rp=100&mode=&sort=21&keyword=&stype=1&othercon=2&request_locale={}&page={page}",
            self.base, self.locale
        )
    }

    #[must_use]
    pub fn faq_list(&self, page: u32) -> String {
        format!(
            "{}faq_search.action?ope=2&stype=2&keyword=&tag=-1&sort=2&rp=100&page={page}",
            self.base
        )
    }

    #[must_use]
    pub fn faq_detail(&self, faq_id: &str) -> String {
        format!(
            "{}faq_search.action?ope=5&fid={faq_id}&request_locale={}",
            self.base, self.locale
        )
    }

    /// The card's Q&A page, where supplement text lives.
    #[must_use]
    pub fn card_supplement(&self, card_id: &str) -> String {
        format!(
            "{}faq_search.action?ope=4&cid={card_id}&request_locale={}",
            self.base, self.locale
        )
    }

    /// The FAQ search landing page, fetched only for its cookies.
    #[must_use]
    pub fn session(&self) -> String {
        format!(
            "{}faq_search.action?ope=1&request_locale={}",
            self.base, self.locale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_site_urls() {
        let urls = Urls::default();
        assert_eq!(
            urls.faq_detail("115"),
            "https://www.db.yugioh-card.com/yugiohdb/faq_search.action?ope=5&fid=115&request_locale=ja"
        );
        assert_eq!(
            urls.card_supplement("4007"),
            "https://www.db.yugioh-card.com/yugiohdb/faq_search.action?ope=4&cid=4007&request_locale=ja"
        );
        assert!(urls.card_list(3).ends_with("&request_locale=ja&page=3"));
        assert!(urls.faq_list(2).contains("sort=2&rp=100&page=2"));
    }

    #[test]
    fn normalizes_base_slash() {
        let urls = Urls::new("http://localhost:8080/db", "en");
        assert_eq!(
            urls.session(),
            "http://localhost:8080/db/faq_search.action?ope=1&request_locale=en"
        );
    }
}
