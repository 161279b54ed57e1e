//! Indicator phrase dictionary
//!
//! Two wordlists are concatenated into one ordered dictionary: framework
//! fingerprints first, then generic "interesting" words. Matching is a pure
//! function of the text and the dictionary: case-insensitive substring
//! containment, no tokenizing, results in dictionary order.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Default location of the framework fingerprint wordlist
pub const DEFAULT_JS_WORDLIST: &str = "wordlists/js.json";

/// Default location of the generic indicator wordlist
pub const DEFAULT_WORDS_WORDLIST: &str = "wordlists/nice_words.json";

#[derive(Deserialize)]
struct JsWordlist {
    js: Vec<String>,
}

#[derive(Deserialize)]
struct NiceWordlist {
    words: Vec<String>,
}

/// Ordered set of indicator phrases, shared read-only for the whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseDictionary {
    phrases: Vec<String>,
    lowered: Vec<String>,
}

impl PhraseDictionary {
    /// Concatenate fingerprint phrases and generic words
    pub fn from_lists<I, J>(fingerprints: I, words: J) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        let phrases: Vec<String> = fingerprints
            .into_iter()
            .map(Into::into)
            .chain(words.into_iter().map(Into::into))
            .collect();
        let lowered = phrases.iter().map(|p| p.to_lowercase()).collect();
        Self { phrases, lowered }
    }

    /// Load `{"js": [...]}` and `{"words": [...]}` wordlists
    pub fn load(js_path: &Path, words_path: &Path) -> Result<Self, ConfigError> {
        let js: JsWordlist = read_wordlist(js_path)?;
        let words: NiceWordlist = read_wordlist(words_path)?;
        debug!(
            fingerprints = js.js.len(),
            words = words.words.len(),
            "Loaded phrase dictionary"
        );
        Ok(Self::from_lists(js.js, words.words))
    }

    /// Phrases in dictionary order, as written in the wordlists
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Number of phrases
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Every phrase contained in `text`, ignoring case, in dictionary order
    pub fn find_in(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        self.find_in_lowercase(&haystack)
    }

    /// Like [`find_in`](Self::find_in) for text that is already lowercase
    pub fn find_in_lowercase(&self, haystack: &str) -> Vec<String> {
        self.phrases
            .iter()
            .zip(&self.lowered)
            .filter(|(_, needle)| haystack.contains(needle.as_str()))
            .map(|(phrase, _)| phrase.clone())
            .collect()
    }
}

fn read_wordlist<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let wordlist_error = |reason: String| ConfigError::Wordlist {
        path: path.display().to_string(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| wordlist_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| wordlist_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_example() {
        let dict = PhraseDictionary::from_lists(["react", "vue"], Vec::<String>::new());
        assert_eq!(dict.find_in("Built with React 18"), vec!["react"]);
    }

    #[test]
    fn test_order_follows_dictionary() {
        let dict = PhraseDictionary::from_lists(["next.js", "react"], ["token"]);
        let found = dict.find_in("token=abc; powered by React and Next.js");
        assert_eq!(found, vec!["next.js", "react", "token"]);
    }

    #[test]
    fn test_substring_inside_longer_token_counts() {
        let dict = PhraseDictionary::from_lists(["vue"], ["admin"]);
        assert_eq!(dict.find_in("window.__VUEX__ = {}; superadministrator"), vec!["vue", "admin"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let dict = PhraseDictionary::from_lists(["angular"], ["secret"]);
        assert!(dict.find_in("plain text").is_empty());
        assert!(dict.find_in("").is_empty());
    }

    #[test]
    fn test_mixed_case_phrases_keep_original_spelling() {
        let dict = PhraseDictionary::from_lists(["jQuery"], Vec::<String>::new());
        assert_eq!(dict.find_in("JQUERY v3"), vec!["jQuery"]);
    }

    #[test]
    fn test_matching_does_not_mutate_dictionary() {
        let dict = PhraseDictionary::from_lists(["React"], ["API"]);
        let before = dict.clone();
        dict.find_in("react api");
        assert_eq!(dict, before);
        assert_eq!(dict.phrases(), &["React".to_string(), "API".to_string()]);
    }

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "epsniff-{}-{}-{}",
            std::process::id(),
            name,
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_wordlists() {
        let js = temp_file("js.json", r#"{"js": ["react", "vue"]}"#);
        let words = temp_file("words.json", r#"{"words": ["password"]}"#);

        let dict = PhraseDictionary::load(&js, &words).unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.phrases()[2], "password");

        let _ = std::fs::remove_file(js);
        let _ = std::fs::remove_file(words);
    }

    #[test]
    fn test_missing_wordlist_is_fatal() {
        let words = temp_file("words-only.json", r#"{"words": []}"#);
        let err = PhraseDictionary::load(Path::new("/nonexistent/js.json"), &words).unwrap_err();
        assert!(matches!(err, ConfigError::Wordlist { ref path, .. } if path.contains("js.json")));
        let _ = std::fs::remove_file(words);
    }

    #[test]
    fn test_wrong_key_is_fatal() {
        let js = temp_file("bad-js.json", r#"{"frameworks": ["react"]}"#);
        let words = temp_file("ok-words.json", r#"{"words": []}"#);
        assert!(PhraseDictionary::load(&js, &words).is_err());
        let _ = std::fs::remove_file(js);
        let _ = std::fs::remove_file(words);
    }
}
