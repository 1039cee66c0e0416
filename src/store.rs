//! On-disk tab configuration.
//!
//! The file is line oriented. The first line holds the schema version the
//! records were written with, every other line is one tab:
//!
//! ```text
//! 4
//! 0§General§.*§false§§true§false
//! 0§Trade§wts§true§§true§true
//! 1§General§.*§false§§true§false
//! ```
//!
//! Older files are brought up to [`CURRENT_VERSION`] one step at a time by
//! [`migrate_record`] before a record is parsed. Writes always use the
//! current version and replace the whole file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::{ReadError, TabError};
use crate::group::TabGroup;
use crate::tab::{Tab, TabSettings};

pub const DELIMITER: char = '§';
pub const CURRENT_VERSION: u32 = 4;

pub const RECORD_FIELDS: usize = 7;

/// Split ceiling for a record. Tokens past [`RECORD_FIELDS`] are ignored.
const SPLIT_LIMIT: usize = 99;

type Migration = fn(&mut String);

/// `MIGRATIONS[n]` rewrites a version `n + 1` record into version `n + 2`.
const MIGRATIONS: [Migration; (CURRENT_VERSION - 1) as usize] =
    [add_prefix, add_groups, add_notify];

// v1 -> v2
fn add_prefix(record: &mut String) {
    record.push(DELIMITER);
}

// v2 -> v3
fn add_groups(record: &mut String) {
    record.push_str("§true");
    record.insert_str(0, "0§");
}

// v3 -> v4
fn add_notify(record: &mut String) {
    record.push_str("§false");
}

/// Rewrites a record written under schema `from` into the current layout.
pub fn migrate_record(from: u32, record: &str) -> String {
    let mut record = record.to_owned();
    let skip = from.saturating_sub(1) as usize;
    for step in MIGRATIONS.iter().skip(skip) {
        step(&mut record);
    }
    record
}

fn parse_flag(token: &str) -> bool {
    token.eq_ignore_ascii_case("true")
}

fn parse_version(line: &str) -> Result<u32, ReadError> {
    let version = line
        .trim()
        .parse::<u32>()
        .map_err(|_| ReadError::BadVersion(line.to_owned()))?;

    if version == 0 {
        return Err(ReadError::BadVersion(line.to_owned()));
    }
    if version > CURRENT_VERSION {
        return Err(ReadError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    Ok(version)
}

/// Parses a whole tab file. Groups are split wherever the ordinal token
/// differs from the previous record's.
pub fn decode(text: &str) -> Result<Vec<TabGroup>, ReadError> {
    let mut lines = text.lines().enumerate();
    let Some((_, version_line)) = lines.by_ref().find(|(_, line)| !line.trim().is_empty())
    else {
        return Ok(Vec::new());
    };
    let version = parse_version(version_line)?;

    let mut groups: Vec<TabGroup> = Vec::new();
    let mut current_ordinal: Option<String> = None;

    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }

        let line_no = index + 1;
        let record = migrate_record(version, line);
        let fields = record.splitn(SPLIT_LIMIT, DELIMITER).collect::<Vec<_>>();
        if fields.len() < RECORD_FIELDS {
            return Err(ReadError::MalformedRecord {
                line: line_no,
                expected: RECORD_FIELDS,
                found: fields.len(),
            });
        }

        if current_ordinal.as_deref() != Some(fields[0]) {
            groups.push(TabGroup::new());
            current_ordinal = Some(fields[0].to_owned());
        }

        let settings = TabSettings {
            pattern: fields[2].to_owned(),
            literal: parse_flag(fields[3]),
            prefix: fields[4].to_owned(),
            whitelist: parse_flag(fields[5]),
            notify: parse_flag(fields[6]),
        };
        let tab = Tab::new(fields[1], &settings).map_err(|err| ReadError::StoredPattern {
            line: line_no,
            source: Box::new(err),
        })?;

        if let Some(group) = groups.last_mut() {
            group.insert(tab);
        }
    }

    Ok(groups)
}

pub fn encode(groups: &[TabGroup]) -> String {
    let mut out = format!("{CURRENT_VERSION}\n");
    for (ordinal, group) in groups.iter().enumerate() {
        for tab in group {
            out.push_str(&format!(
                "{ordinal}{DELIMITER}{}{DELIMITER}{}\n",
                tab.name(),
                tab.export_record()
            ));
        }
    }
    out
}

/// File-backed tab storage. Never fails towards its caller: loading falls
/// back to no groups, saving falls back to a log line.
#[derive(Debug, Clone)]
pub struct TabStore {
    path: PathBuf,
}

impl TabStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("filtertabs").join("tabs.dat"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Vec<TabGroup>, TabError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no tab file yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(ReadError::Io(err).into()),
        };

        let groups = decode(&text)?;
        info!(
            path = %self.path.display(),
            groups = groups.len(),
            "loaded tab configuration"
        );
        Ok(groups)
    }

    pub fn load(&self) -> Vec<TabGroup> {
        match self.try_load() {
            Ok(groups) => groups,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable tab file");
                Vec::new()
            }
        }
    }

    /// Writes to a sibling temp file first, then renames it over the target.
    pub fn try_save(&self, groups: &[TabGroup]) -> Result<(), TabError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(TabError::PersistenceWrite)?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        fs::write(&temp, encode(groups)).map_err(TabError::PersistenceWrite)?;
        if let Err(err) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(TabError::PersistenceWrite(err));
        }
        debug!(path = %self.path.display(), "saved tab configuration");
        Ok(())
    }

    pub fn save(&self, groups: &[TabGroup]) {
        if let Err(err) = self.try_save(groups) {
            error!(path = %self.path.display(), error = %err, "failed to save tabs");
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{CURRENT_VERSION, TabStore, decode, encode, migrate_record};
    use crate::error::{ReadError, TabError};
    use crate::group::TabGroup;
    use crate::tab::{Tab, TabSettings};

    fn tab(name: &str, settings: TabSettings) -> Tab {
        Tab::new(name, &settings).unwrap()
    }

    fn sample_groups() -> Vec<TabGroup> {
        let mut first = TabGroup::with_default_tab();
        first.insert(tab(
            "Trade",
            TabSettings {
                pattern: "wts".to_owned(),
                literal: true,
                whitelist: true,
                prefix: "/tc ".to_owned(),
                notify: true,
            },
        ));
        first.insert(tab(
            "NoSpam",
            TabSettings {
                pattern: "spa+m".to_owned(),
                literal: false,
                whitelist: false,
                prefix: String::new(),
                notify: false,
            },
        ));
        let second = TabGroup::with_default_tab();
        vec![first, second]
    }

    #[test]
    fn migration_chain_appends_defaults() {
        assert_eq!(migrate_record(1, "General§.*§false"), "0§General§.*§false§§true§false");
        assert_eq!(migrate_record(2, "General§.*§false§/g "), "0§General§.*§false§/g §true§false");
        assert_eq!(migrate_record(3, "2§Trade§wts§true§§false"), "2§Trade§wts§true§§false§false");
        assert_eq!(migrate_record(4, "0§A§b§true§§true§true"), "0§A§b§true§§true§true");
    }

    #[test]
    fn version_one_record_loads_with_defaults() {
        let groups = decode("1\nGeneral§.*§false\n").unwrap();
        assert_eq!(groups.len(), 1);

        let general = groups[0].get("General").unwrap();
        assert_eq!(general.pattern(), ".*");
        assert!(!general.is_literal());
        assert_eq!(general.prefix(), "");
        assert!(general.is_whitelist());
        assert!(!general.notifies());
    }

    #[test]
    fn encode_writes_current_version_first() {
        let text = encode(&sample_groups());
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("4"));
        assert_eq!(lines.next(), Some("0§General§.*§false§§true§false"));
        assert_eq!(lines.next(), Some("0§Trade§wts§true§/tc §true§true"));
        assert_eq!(lines.next(), Some("0§NoSpam§spa+m§false§§false§false"));
        assert_eq!(lines.next(), Some("1§General§.*§false§§true§false"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn older_versions_decode_like_current() {
        let direct = decode(
            "4\n0§General§.*§false§§true§false\n0§Trade§wts§true§§true§false\n",
        )
        .unwrap();

        let v1 = decode("1\nGeneral§.*§false\nTrade§wts§true\n").unwrap();
        let v2 = decode("2\nGeneral§.*§false§\nTrade§wts§true§\n").unwrap();
        let v3 = decode("3\n0§General§.*§false§§true\n0§Trade§wts§true§§true\n").unwrap();

        assert_eq!(v1, direct);
        assert_eq!(v2, direct);
        assert_eq!(v3, direct);
    }

    #[test]
    fn group_ordinal_is_a_change_marker() {
        let groups = decode(
            "4\n\
             7§A§a§true§§true§false\n\
             7§B§b§true§§true§false\n\
             3§C§c§true§§true§false\n\
             7§D§d§true§§true§false\n",
        )
        .unwrap();

        let names = groups
            .iter()
            .map(|group| group.names().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![vec!["A", "B"], vec!["C"], vec!["D"]]);
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        let groups = decode("4\n0§General§.*§false§§true§true§0.33\n").unwrap();
        let general = groups[0].get("General").unwrap();
        assert!(general.notifies());
        assert_eq!(general.pattern(), ".*");
    }

    #[test]
    fn flags_parse_like_the_legacy_reader() {
        let groups = decode("4\n0§A§a§TRUE§§yes§True\n").unwrap();
        let tab = groups[0].get("A").unwrap();
        assert!(tab.is_literal());
        assert!(!tab.is_whitelist());
        assert!(tab.notifies());
    }

    #[test]
    fn empty_text_has_no_groups() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("\n\n").unwrap().is_empty());
        assert!(decode("4\n").unwrap().is_empty());
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(decode("four\n"), Err(ReadError::BadVersion(_))));
        assert!(matches!(decode("0\n"), Err(ReadError::BadVersion(_))));
        assert!(matches!(
            decode("9\n0§A§a§true§§true§false\n"),
            Err(ReadError::UnsupportedVersion { found: 9, supported: CURRENT_VERSION })
        ));
        assert!(matches!(
            decode("4\n0§A§a\n"),
            Err(ReadError::MalformedRecord { line: 2, expected: 7, found: 3 })
        ));
        assert!(matches!(
            decode("4\n0§A§(§false§§true§false\n"),
            Err(ReadError::StoredPattern { line: 2, .. })
        ));
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabs.dat");
        std::fs::create_dir(&path).unwrap();

        let store = TabStore::new(&path);
        assert!(matches!(
            store.try_save(&sample_groups()),
            Err(TabError::PersistenceWrite(_))
        ));
        assert!(!dir.path().join("tabs.dat.tmp").exists());
    }

    #[test]
    fn load_errors_carry_the_decode_reason() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabs.dat");
        std::fs::write(&path, "4\n0§A§a\n").unwrap();

        let store = TabStore::new(&path);
        assert!(matches!(
            store.try_load(),
            Err(TabError::PersistenceRead(ReadError::MalformedRecord { line: 2, .. }))
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn round_trip_sample() {
        let groups = sample_groups();
        assert_eq!(decode(&encode(&groups)).unwrap(), groups);
    }

    fn settings_strategy() -> impl Strategy<Value = TabSettings> {
        let literal = ("[ -~é§\r\n]{1,8}", any::<bool>(), "[ -~é§\n]{0,6}", any::<bool>()).prop_map(
            |(pattern, whitelist, prefix, notify)| TabSettings {
                pattern,
                literal: true,
                whitelist,
                prefix,
                notify,
            },
        );
        let regex = (
            prop::sample::select(vec![".*", "^\\[G\\]", "w[ts]s", "(?i)error|warn", "\\d{3}"]),
            any::<bool>(),
            "[ -~é§\n]{0,6}",
            any::<bool>(),
        )
            .prop_map(|(pattern, whitelist, prefix, notify)| TabSettings {
                pattern: pattern.to_owned(),
                literal: false,
                whitelist,
                prefix,
                notify,
            });
        prop_oneof![literal, regex]
    }

    proptest! {
        #[test]
        fn encode_then_decode_is_identity(
            layout in prop::collection::vec(prop::collection::vec(settings_strategy(), 1..6), 1..4)
        ) {
            let mut groups = Vec::new();
            for tabs in &layout {
                let mut group = TabGroup::new();
                for (index, settings) in tabs.iter().enumerate() {
                    match Tab::new(format!("tab{index}"), settings) {
                        Ok(tab) => group.insert(tab),
                        Err(err) => prop_assert!(matches!(
                            err,
                            TabError::ReservedDelimiter { .. } | TabError::LineBreak { .. }
                        ), "unexpected error: {:?}", err),
                    }
                }
                if !group.is_empty() {
                    groups.push(group);
                }
            }

            prop_assert_eq!(decode(&encode(&groups)).unwrap(), groups);
        }
    }
}
