//! Boolean feature flags shared by every subscriber
//!
//! The log itself never reads a flag; the result-screen override and host
//! subscribers do. A settings file is either a JSON array of enabled flag
//! names or an object mapping names to booleans.

use crate::{BattleLogError, Result};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Skip overriding the spectator result screen
pub const DISABLE_RESULT_TOAST: &str = "setting.disable.resultToast";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    flags: FxHashSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SettingsFile {
    List(Vec<String>),
    Map(BTreeMap<String, bool>),
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn set(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
    }

    pub fn unset(&mut self, flag: &str) {
        self.flags.remove(flag);
    }

    /// Parse a settings document
    pub fn from_json(text: &str) -> Result<Self> {
        let file: SettingsFile = serde_json::from_str(text)
            .map_err(|e| BattleLogError::Settings(format!("invalid settings document: {e}")))?;
        Ok(match file {
            SettingsFile::List(names) => names.into_iter().collect(),
            SettingsFile::Map(entries) => entries
                .into_iter()
                .filter_map(|(name, enabled)| enabled.then_some(name))
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Enabled flags in sorted order
    pub fn flags(&self) -> Vec<&str> {
        let mut flags: Vec<&str> = self.flags.iter().map(String::as_str).collect();
        flags.sort_unstable();
        flags
    }
}

impl<S: Into<String>> FromIterator<S> for Settings {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Settings {
            flags: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut settings = Settings::new();
        assert!(!settings.is_set(DISABLE_RESULT_TOAST));

        settings.set(DISABLE_RESULT_TOAST);
        assert!(settings.is_set(DISABLE_RESULT_TOAST));

        settings.unset(DISABLE_RESULT_TOAST);
        assert!(!settings.is_set(DISABLE_RESULT_TOAST));
    }

    #[test]
    fn test_settings_from_list() {
        let settings = Settings::from_json(r#"["setting.disable.bgm", "setting.disable.spells"]"#).unwrap();
        assert_eq!(settings.flags(), vec!["setting.disable.bgm", "setting.disable.spells"]);
    }

    #[test]
    fn test_settings_from_map() {
        let settings = Settings::from_json(
            r#"{"setting.disable.resultToast": true, "setting.disable.bgm": false}"#,
        )
        .unwrap();
        assert!(settings.is_set(DISABLE_RESULT_TOAST));
        assert!(!settings.is_set("setting.disable.bgm"));
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(Settings::from_json("42"), Err(BattleLogError::Settings(_))));
    }
}
