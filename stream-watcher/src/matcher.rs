/// Case-insensitive substring matching against an ordered keyword list.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    lowered: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.to_vec(),
            lowered: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// First configured keyword contained in `body`, in configuration order.
    pub fn first_match(&self, body: &str) -> Option<&str> {
        let body = body.to_lowercase();
        self.lowered
            .iter()
            .position(|keyword| body.contains(keyword.as_str()))
            .map(|index| self.keywords[index].as_str())
    }
}

/// Uniform random choice over the reply phrases.
#[derive(Debug)]
pub struct PhrasePicker {
    phrases: Vec<String>,
    rng: fastrand::Rng,
}

impl PhrasePicker {
    pub fn new(phrases: &[String]) -> Self {
        Self::with_rng(phrases, fastrand::Rng::new())
    }

    pub fn with_rng(phrases: &[String], rng: fastrand::Rng) -> Self {
        Self {
            phrases: phrases.to_vec(),
            rng,
        }
    }

    pub fn pick(&mut self) -> Option<&str> {
        if self.phrases.is_empty() {
            return None;
        }
        let index = self.rng.usize(..self.phrases.len());
        Some(self.phrases[index].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let matcher = KeywordMatcher::new(&strings(&["bot", "spam"]));
        assert_eq!(matcher.first_match("are you a BOT?"), Some("bot"));
        assert_eq!(matcher.first_match("SpAm everywhere"), Some("spam"));
    }

    #[test]
    fn test_uppercase_keyword_matches_lowercase_body() {
        let matcher = KeywordMatcher::new(&strings(&["Rust"]));
        assert_eq!(matcher.first_match("i love rust"), Some("Rust"));
    }

    #[test]
    fn test_first_configured_keyword_wins() {
        let matcher = KeywordMatcher::new(&strings(&["spam", "bot"]));
        assert_eq!(matcher.first_match("bot posting spam"), Some("spam"));
    }

    #[test]
    fn test_substring_match() {
        let matcher = KeywordMatcher::new(&strings(&["bot"]));
        assert_eq!(matcher.first_match("robots are cool"), Some("bot"));
    }

    #[test]
    fn test_no_match() {
        let matcher = KeywordMatcher::new(&strings(&["bot", "spam"]));
        assert_eq!(matcher.first_match("a perfectly human comment"), None);
        assert_eq!(matcher.first_match(""), None);
    }

    #[test]
    fn test_picker_only_returns_configured_phrases() {
        let phrases = strings(&["one", "two", "three"]);
        let mut picker = PhrasePicker::with_rng(&phrases, fastrand::Rng::with_seed(7));

        let mut picked = HashSet::new();
        for _ in 0..300 {
            let phrase = picker.pick().unwrap().to_string();
            assert!(phrases.contains(&phrase));
            picked.insert(phrase);
        }
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_picker_with_no_phrases() {
        let mut picker = PhrasePicker::new(&[]);
        assert!(picker.pick().is_none());
    }
}
