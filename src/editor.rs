//! Checks the tab editor runs before handing a draft to the manager.

use crate::classifier::Classifier;
use crate::error::{Result, TabError};
use crate::group::TabGroup;
use crate::tab::{TabSettings, check_field};

/// Longest tab name the editor accepts.
pub const MAX_TAB_NAME_LEN: usize = 8;

/// Longest pattern the editor accepts.
pub const MAX_PATTERN_LEN: usize = 1024;

/// Longest prefix the editor accepts.
pub const MAX_PREFIX_LEN: usize = 255;

/// What the user has typed and toggled so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabDraft {
    pub name: String,
    pub settings: TabSettings,
}

impl TabDraft {
    pub fn new(name: impl Into<String>, settings: TabSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    /// Validates the draft against `group`. `editing` is true when the draft
    /// updates an existing tab, in which case its name may already be taken.
    pub fn validate(&self, group: &TabGroup, editing: bool) -> Result<()> {
        let name = self.name.as_str();
        if name.is_empty() {
            return Err(TabError::EmptyName);
        }
        if name.chars().count() > MAX_TAB_NAME_LEN {
            return Err(TabError::NameTooLong {
                name: name.to_owned(),
                max: MAX_TAB_NAME_LEN,
            });
        }
        if self.settings.pattern.is_empty() {
            return Err(TabError::EmptyPattern);
        }

        for (field, value, max) in [
            ("name", name, MAX_TAB_NAME_LEN),
            ("pattern", self.settings.pattern.as_str(), MAX_PATTERN_LEN),
            ("prefix", self.settings.prefix.as_str(), MAX_PREFIX_LEN),
        ] {
            if value.chars().count() > max {
                return Err(TabError::FieldTooLong { field, max });
            }
            check_field(field, value)?;
        }

        Classifier::compile(
            &self.settings.pattern,
            self.settings.literal,
            self.settings.whitelist,
        )?;

        if !editing && group.contains(name) {
            return Err(TabError::DuplicateName(name.to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_PATTERN_LEN, MAX_PREFIX_LEN, MAX_TAB_NAME_LEN, TabDraft};
    use crate::error::TabError;
    use crate::group::TabGroup;
    use crate::tab::TabSettings;

    fn draft(name: &str, pattern: &str) -> TabDraft {
        TabDraft::new(name, TabSettings::keyword(pattern))
    }

    #[test]
    fn accepts_a_reasonable_draft() {
        let group = TabGroup::with_default_tab();
        assert!(draft("Trade", "wts").validate(&group, false).is_ok());
    }

    #[test]
    fn rejects_empty_and_long_names() {
        let group = TabGroup::with_default_tab();
        assert!(matches!(
            draft("", "wts").validate(&group, false),
            Err(TabError::EmptyName)
        ));
        assert!(matches!(
            draft("Marketplace", "wts").validate(&group, false),
            Err(TabError::NameTooLong { max: MAX_TAB_NAME_LEN, .. })
        ));
    }

    #[test]
    fn rejects_bad_patterns() {
        let group = TabGroup::with_default_tab();
        assert!(matches!(
            draft("Trade", "").validate(&group, false),
            Err(TabError::EmptyPattern)
        ));

        let regex = TabDraft::new(
            "Trade",
            TabSettings {
                pattern: "w(ts".to_owned(),
                literal: false,
                ..TabSettings::default()
            },
        );
        assert!(matches!(
            regex.validate(&group, false),
            Err(TabError::InvalidPattern { .. })
        ));

        assert!(draft("Trade", "w(ts").validate(&group, false).is_ok());
    }

    #[test]
    fn rejects_the_file_delimiter() {
        let group = TabGroup::with_default_tab();
        assert!(matches!(
            draft("A§B", "x").validate(&group, false),
            Err(TabError::ReservedDelimiter { field: "name", .. })
        ));

        let mut prefixed = draft("Trade", "wts");
        prefixed.settings.prefix = "§c".to_owned();
        assert!(matches!(
            prefixed.validate(&group, false),
            Err(TabError::ReservedDelimiter { field: "prefix", .. })
        ));
    }

    #[test]
    fn line_breaks_get_their_own_error() {
        let group = TabGroup::with_default_tab();
        let err = draft("Trade", "wts\nwtb").validate(&group, false).unwrap_err();
        assert!(matches!(err, TabError::LineBreak { field: "pattern" }));
        assert_eq!(err.to_string(), "pattern must fit on one line");
    }

    #[test]
    fn long_patterns_and_prefixes_are_rejected() {
        let group = TabGroup::with_default_tab();
        assert!(draft("Trade", &"x".repeat(MAX_PATTERN_LEN)).validate(&group, false).is_ok());
        assert!(matches!(
            draft("Trade", &"x".repeat(MAX_PATTERN_LEN + 1)).validate(&group, false),
            Err(TabError::FieldTooLong { field: "pattern", max: MAX_PATTERN_LEN })
        ));

        let mut prefixed = draft("Trade", "wts");
        prefixed.settings.prefix = "é".repeat(MAX_PREFIX_LEN + 1);
        assert!(matches!(
            prefixed.validate(&group, false),
            Err(TabError::FieldTooLong { field: "prefix", max: MAX_PREFIX_LEN })
        ));
    }

    #[test]
    fn duplicate_names_only_matter_when_creating() {
        let group = TabGroup::with_default_tab();
        let general = TabDraft::new("General", TabSettings::default());

        assert!(matches!(
            general.validate(&group, false),
            Err(TabError::DuplicateName(_))
        ));
        assert!(general.validate(&group, true).is_ok());
    }

    #[test]
    fn name_length_counts_characters() {
        let group = TabGroup::with_default_tab();
        assert!(draft("ÄÖÜäöüßé", "wts").validate(&group, false).is_ok());
        assert!(matches!(
            draft("ÄÖÜäöüßéx", "wts").validate(&group, false),
            Err(TabError::NameTooLong { .. })
        ));
    }
}
