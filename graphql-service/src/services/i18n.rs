//! Message catalogs and per-request localization.
//!
//! Catalogs are flat `key -> template` JSON maps compiled into the binary.
//! Templates use `{name}` placeholders.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

const EN_MESSAGES: &str = include_str!("../../locales/en.json");
const JA_MESSAGES: &str = include_str!("../../locales/ja.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    En,
    Ja,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ja => "ja",
        }
    }

    /// Match a BCP 47 tag on its primary subtag, so `ja-JP` selects `Ja`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "ja" => Some(Locale::Ja),
            _ => None,
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_tag(s).ok_or_else(|| format!("Unsupported locale: {}", s))
    }
}

/// Pick a locale from the `lang` query value, then `Accept-Language`, then `fallback`.
///
/// `Accept-Language` entries are tried in descending `q` order; `q=0` entries are skipped.
pub fn negotiate(lang: Option<&str>, accept_language: Option<&str>, fallback: Locale) -> Locale {
    if let Some(locale) = lang.and_then(Locale::from_tag) {
        return locale;
    }

    let Some(header) = accept_language else {
        return fallback;
    };

    let mut candidates: Vec<(f32, &str)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            let q = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0 && !tag.is_empty()).then_some((q, tag))
        })
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    candidates
        .into_iter()
        .find_map(|(_, tag)| Locale::from_tag(tag))
        .unwrap_or(fallback)
}

#[derive(Debug)]
pub struct Catalog {
    default_locale: Locale,
    messages: HashMap<Locale, HashMap<String, String>>,
}

impl Catalog {
    /// Load the catalogs bundled with the binary.
    pub fn embedded(default_locale: Locale) -> Result<Self, anyhow::Error> {
        let mut messages = HashMap::new();
        for (locale, raw) in [(Locale::En, EN_MESSAGES), (Locale::Ja, JA_MESSAGES)] {
            let parsed: HashMap<String, String> = serde_json::from_str(raw).map_err(|e| {
                anyhow::anyhow!("Invalid message catalog '{}': {}", locale.as_str(), e)
            })?;
            messages.insert(locale, parsed);
        }

        Ok(Self {
            default_locale,
            messages,
        })
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.messages
            .get(&locale)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }
}

/// A catalog bound to the locale negotiated for one request.
#[derive(Debug, Clone)]
pub struct Localizer {
    locale: Locale,
    catalog: Arc<Catalog>,
}

impl Localizer {
    pub fn new(catalog: Arc<Catalog>, locale: Locale) -> Self {
        Self { locale, catalog }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Message for `key`, falling back to the default locale and finally to the key itself.
    pub fn t(&self, key: &str) -> String {
        self.catalog
            .lookup(self.locale, key)
            .or_else(|| self.catalog.lookup(self.catalog.default_locale, key))
            .unwrap_or(key)
            .to_string()
    }

    pub fn t_with(&self, key: &str, vars: &[(&str, String)]) -> String {
        vars.iter()
            .fold(self.t(key), |msg, (name, value)| {
                msg.replace(&format!("{{{}}}", name), value)
            })
    }
}
