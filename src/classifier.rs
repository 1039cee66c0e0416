use regex::Regex;

use crate::error::{Result, TabError};

/// Accept/reject decision for one tab, compiled once from its pattern.
#[derive(Debug, Clone)]
pub struct Classifier {
    pattern: String,
    literal: bool,
    whitelist: bool,
    matcher: Regex,
}

impl Classifier {
    /// Literal patterns are escaped before compiling and cannot fail.
    pub fn compile(pattern: &str, literal: bool, whitelist: bool) -> Result<Self> {
        let source = if literal {
            regex::escape(pattern)
        } else {
            pattern.to_owned()
        };

        let matcher = Regex::new(&source).map_err(|source| TabError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_owned(),
            literal,
            whitelist,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    pub fn is_whitelist(&self) -> bool {
        self.whitelist
    }

    /// Whether the pattern occurs anywhere in `message`.
    pub fn find(&self, message: &str) -> bool {
        self.matcher.is_match(message)
    }

    pub fn accepts(&self, message: &str) -> bool {
        self.find(message) == self.whitelist
    }
}

impl PartialEq for Classifier {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.literal == other.literal
            && self.whitelist == other.whitelist
    }
}

impl Eq for Classifier {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use regex::Regex;

    use super::Classifier;
    use crate::error::TabError;

    #[test]
    fn invalid_regex_is_rejected() {
        let err = Classifier::compile("(unclosed", false, true).unwrap_err();
        assert!(matches!(err, TabError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn any_string_is_a_valid_literal() {
        let classifier = Classifier::compile("(unclosed [", true, true).unwrap();
        assert!(classifier.accepts("look: (unclosed [ here"));
        assert!(!classifier.accepts("unclosed"));
    }

    #[test]
    fn regex_is_searched_not_anchored() {
        let classifier = Classifier::compile("w[ts]s", false, true).unwrap();
        assert!(classifier.accepts("selling: wts diamond sword"));
        assert!(!classifier.accepts("nothing here"));
    }

    #[test]
    fn blacklist_inverts_the_match() {
        let classifier = Classifier::compile("spam", false, false).unwrap();
        assert!(!classifier.accepts("buy spam now"));
        assert!(classifier.accepts("hi there"));
    }

    #[test]
    fn empty_message_is_evaluated_normally() {
        let everything = Classifier::compile(".*", false, true).unwrap();
        assert!(everything.accepts(""));

        let keyword = Classifier::compile("x", true, true).unwrap();
        assert!(!keyword.accepts(""));
        let not_keyword = Classifier::compile("x", true, false).unwrap();
        assert!(not_keyword.accepts(""));
    }

    proptest! {
        #[test]
        fn literal_accepts_iff_contains(
            pattern in "[a-z.*+?()\\[\\]]{1,4}",
            message in "[a-z.*+?()\\[\\] ]{0,24}",
            whitelist in any::<bool>(),
        ) {
            let classifier = Classifier::compile(&pattern, true, whitelist).unwrap();
            prop_assert_eq!(classifier.accepts(&message), message.contains(&pattern) == whitelist);
        }

        #[test]
        fn regex_accepts_iff_search_matches(
            pattern in prop::sample::select(vec!["a+b", "^x", "y$", "[0-9]{2}", ".*", "a|b", "\\d"]),
            message in "[abxy0-9 ]{0,16}",
            whitelist in any::<bool>(),
        ) {
            let classifier = Classifier::compile(pattern, false, whitelist).unwrap();
            let found = Regex::new(pattern).unwrap().find(&message).is_some();
            prop_assert_eq!(classifier.accepts(&message), found == whitelist);
        }
    }
}
