//! JSON-backed message bundles for user-facing notifications.

use std::str::FromStr;
use std::sync::LazyLock;

use serde::Deserialize;
use serde_json::Value;

/// Message key shown when the session expired or was never established.
pub const LOGIN_REQUIRED_KEY: &str = "errors.login_required";
/// Message key shown when the server rejected the request parameters.
pub const INVALID_PARAMS_KEY: &str = "errors.invalid_params";

/// Supported locale codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleCode {
    /// English.
    En,
    /// Chinese (Simplified).
    Zh,
}

impl LocaleCode {
    #[must_use]
    /// All supported locales in display order.
    pub const fn all() -> [Self; 2] {
        [Self::Zh, Self::En]
    }

    /// Two-letter code for the locale.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Map a language tag such as `zh-CN` or `en_US` onto a supported locale.
    #[must_use]
    pub fn from_lang_tag(tag: &str) -> Option<Self> {
        let lowered = tag.trim().to_ascii_lowercase();
        let base = lowered.split(['-', '_']).next().unwrap_or_default();
        Self::all()
            .iter()
            .copied()
            .find(|locale| locale.code() == base)
    }
}

impl FromStr for LocaleCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_lang_tag(s).ok_or_else(|| format!("unsupported locale '{s}'"))
    }
}

/// Locale used when nothing else is configured.
pub const DEFAULT_LOCALE: LocaleCode = LocaleCode::Zh;

/// Translation bundle containing a parsed JSON tree for the locale.
#[derive(Clone, Debug)]
pub struct TranslationBundle {
    locale: LocaleCode,
    tree: Value,
}

impl PartialEq for TranslationBundle {
    fn eq(&self, other: &Self) -> bool {
        self.locale == other.locale
    }
}

impl Default for TranslationBundle {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl TranslationBundle {
    /// Build a translation bundle for the given locale.
    ///
    /// Missing keys degrade to the English bundle, then to the caller default.
    #[must_use]
    pub fn new(locale: LocaleCode) -> Self {
        let tree: Value = serde_json::from_str(raw_locale(locale)).unwrap_or(Value::Null);
        Self { locale, tree }
    }

    /// Locale backing this bundle.
    #[must_use]
    pub const fn locale(&self) -> LocaleCode {
        self.locale
    }

    /// Resolve a dotted path (`section.key`) with English fallback and caller default.
    #[must_use]
    pub fn text(&self, path: &str, default: &str) -> String {
        resolve(&self.tree, path)
            .or_else(|| resolve(&EN_FALLBACK.tree, path))
            .unwrap_or_else(|| default.to_string())
    }
}

static EN_FALLBACK: LazyLock<TranslationBundle> =
    LazyLock::new(|| TranslationBundle::new(LocaleCode::En));

fn resolve(tree: &Value, path: &str) -> Option<String> {
    let mut node = tree;
    for segment in path.split('.') {
        node = node.get(segment)?;
    }
    node.as_str().map(ToString::to_string)
}

const fn raw_locale(locale: LocaleCode) -> &'static str {
    match locale {
        LocaleCode::En => include_str!("../../i18n/en.json"),
        LocaleCode::Zh => include_str!("../../i18n/zh.json"),
    }
}
