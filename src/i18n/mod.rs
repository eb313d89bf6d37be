//! Internationalization (i18n) support
//!
//! UI strings ship for `en` and `pt-BR`. YAML files in the site's
//! `languages/` directory (`en.yml`, `pt-BR.yml`, ...) override them key by key.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN: [(&str, &str); 2] = [
    ("en", include_str!("en.yml")),
    ("pt-br", include_str!("pt-BR.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language, lowercased (`pt-br`)
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in translations loaded
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN {
            match parse_table(source) {
                Ok(table) => {
                    translations.insert(lang.to_string(), table);
                }
                Err(e) => tracing::error!("Built-in language table {} is invalid: {}", lang, e),
            }
        }

        Self {
            language: normalize(language),
            translations,
        }
    }

    /// Load language override files from a directory
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(normalize)
                .unwrap_or_else(|| "en".to_string());

            let content = fs::read_to_string(&path)?;
            match parse_table(&content) {
                Ok(table) => {
                    self.translations.entry(lang).or_default().extend(table);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key
    pub fn get(&self, key: &str) -> String {
        self.fallback_chain()
            .iter()
            .find_map(|lang| self.translations.get(lang).and_then(|t| t.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// All strings for the current language, with fallbacks filled in
    pub fn strings(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();
        for lang in self.fallback_chain() {
            if let Some(table) = self.translations.get(&lang) {
                for (k, v) in table {
                    result.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }
        result
    }

    /// `pt-br` -> `pt` -> `en`
    fn fallback_chain(&self) -> Vec<String> {
        let mut chain = vec![self.language.clone()];
        if let Some((base, _)) = self.language.split_once('-') {
            chain.push(base.to_string());
        }
        if !chain.iter().any(|l| l == "en") {
            chain.push("en".to_string());
        }
        chain
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}

fn normalize(language: &str) -> String {
    language.trim().to_ascii_lowercase().replace('_', "-")
}

/// Parse a flat `key: text` YAML table
fn parse_table(source: &str) -> Result<HashMap<String, String>> {
    let raw: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(source)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| yaml_value_to_string(&v).map(|s| (k, s)))
        .collect())
}

/// Convert a scalar YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_parse() {
        for (lang, source) in BUILTIN {
            let table = parse_table(source).unwrap();
            assert!(table.contains_key("load_more"), "{lang}");
        }
    }

    #[test]
    fn test_get_translation() {
        let en = I18n::new("en");
        assert_eq!(en.get("load_more"), "Load more posts");
        assert_eq!(en.get("unknown"), "unknown");

        let pt = I18n::new("pt_BR");
        assert_eq!(pt.language(), "pt-br");
        assert_eq!(pt.get("load_more"), "Carregar mais posts");
        assert_eq!(pt.get("previous_post"), "Post anterior");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let fr = I18n::new("fr");
        assert_eq!(fr.get("next_post"), "Next post");
        assert_eq!(fr.strings().get("exit_preview"), Some(&"Exit preview mode".to_string()));
    }

    #[test]
    fn test_load_languages_overrides_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.yml"), "load_more: More, please\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.yml"), ": : :\n- [").unwrap();

        let mut i18n = I18n::new("en");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("load_more"), "More, please");
        assert_eq!(i18n.get("next_post"), "Next post");
    }
}
