use crate::classifier::Classifier;
use crate::error::{Result, TabError};
use crate::store::DELIMITER;

pub const DEFAULT_TAB_NAME: &str = "General";
pub const DEFAULT_PATTERN: &str = ".*";

/// Everything a tab is configured with apart from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSettings {
    pub pattern: String,
    pub literal: bool,
    pub whitelist: bool,
    pub prefix: String,
    pub notify: bool,
}

impl TabSettings {
    /// A whitelist keyword tab with no prefix and no notification.
    pub fn keyword(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            literal: true,
            whitelist: true,
            prefix: String::new(),
            notify: false,
        }
    }
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_owned(),
            literal: false,
            whitelist: true,
            prefix: String::new(),
            notify: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    name: String,
    classifier: Classifier,
    prefix: String,
    notify: bool,
    unread: bool,
}

impl Tab {
    pub fn new(name: impl Into<String>, settings: &TabSettings) -> Result<Self> {
        let name = name.into();
        check_field("name", &name)?;
        check_field("prefix", &settings.prefix)?;
        let classifier = compile(&settings.pattern, settings.literal, settings.whitelist)?;
        Ok(Self {
            name,
            classifier,
            prefix: settings.prefix.clone(),
            notify: settings.notify,
            unread: false,
        })
    }

    /// The tab every fresh group starts with: accepts everything.
    pub fn general() -> Self {
        match Self::new(DEFAULT_TAB_NAME, &TabSettings::default()) {
            Ok(tab) => tab,
            Err(err) => unreachable!("default tab settings are valid: {err}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn pattern(&self) -> &str {
        self.classifier.pattern()
    }

    pub fn is_literal(&self) -> bool {
        self.classifier.is_literal()
    }

    pub fn is_whitelist(&self) -> bool {
        self.classifier.is_whitelist()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        check_field("prefix", &prefix)?;
        self.prefix = prefix;
        Ok(())
    }

    pub fn notifies(&self) -> bool {
        self.notify
    }

    pub fn is_unread(&self) -> bool {
        self.unread
    }

    pub fn mark_unread(&mut self) {
        self.unread = true;
    }

    pub fn mark_read(&mut self) {
        self.unread = false;
    }

    pub fn settings(&self) -> TabSettings {
        TabSettings {
            pattern: self.pattern().to_owned(),
            literal: self.is_literal(),
            whitelist: self.is_whitelist(),
            prefix: self.prefix.clone(),
            notify: self.notify,
        }
    }

    /// Swaps in a new classifier and notify flag. Leaves the tab untouched if
    /// the pattern does not compile.
    pub fn update_pattern(
        &mut self,
        pattern: &str,
        literal: bool,
        whitelist: bool,
        notify: bool,
    ) -> Result<()> {
        self.classifier = compile(pattern, literal, whitelist)?;
        self.notify = notify;
        Ok(())
    }

    pub fn accepts_message(&self, plain_text: &str) -> bool {
        self.classifier.accepts(plain_text)
    }

    /// `General` with the stock classifier and no prefix, i.e. a group nobody
    /// has customised yet.
    pub fn is_untouched_default(&self) -> bool {
        self.name == DEFAULT_TAB_NAME
            && !self.is_literal()
            && self.is_whitelist()
            && self.pattern() == DEFAULT_PATTERN
            && self.prefix.is_empty()
    }

    /// `pattern§literal§prefix§whitelist§notify`, the per-tab tail of a
    /// schema version 4 record.
    pub fn export_record(&self) -> String {
        [
            self.pattern().to_owned(),
            self.is_literal().to_string(),
            self.prefix.clone(),
            self.is_whitelist().to_string(),
            self.notify.to_string(),
        ]
        .join(&DELIMITER.to_string())
    }
}

/// Fields are stored one record per line between delimiters, so neither may
/// appear inside one.
pub(crate) fn check_field(field: &'static str, value: &str) -> Result<()> {
    if value.contains(DELIMITER) {
        return Err(TabError::ReservedDelimiter {
            field,
            delimiter: DELIMITER,
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(TabError::LineBreak { field });
    }
    Ok(())
}

fn compile(pattern: &str, literal: bool, whitelist: bool) -> Result<Classifier> {
    check_field("pattern", pattern)?;
    Classifier::compile(pattern, literal, whitelist)
}
