use serde::{Deserialize, Serialize};

/// Display language for bilingual fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ta,
}

/// English/Tamil text pair. English is mandatory; an empty Tamil value means
/// "not translated".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bilingual {
    pub en: String,
    #[serde(default)]
    pub ta: String,
}

impl Bilingual {
    pub fn new(en: impl Into<String>, ta: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ta: ta.into(),
        }
    }

    pub fn en(en: impl Into<String>) -> Self {
        Self::new(en, String::new())
    }

    /// Text to render for `lang`, falling back to English when the Tamil
    /// variant is blank.
    pub fn resolve(&self, lang: Language) -> &str {
        match lang {
            Language::Ta if !self.ta.trim().is_empty() => &self.ta,
            _ => &self.en,
        }
    }

    pub fn has_translation(&self) -> bool {
        !self.ta.trim().is_empty()
    }
}
