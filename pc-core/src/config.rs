//! Persistent configuration document
//!
//! Settings are stored as a JSON document on disk and reconciled against a
//! built-in template on every load: template keys that are missing, empty, or
//! carry a value of the wrong type are reset to their defaults, nested
//! sections are reconciled recursively, and keys the template does not know
//! about are preserved unchanged. A malformed file is surfaced as
//! [`PicontrolError::ConfigCorrupt`] instead of being overwritten.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::paths;
use crate::error::{PicontrolError, Result};

/// Default configuration document written on first start.
///
/// The `fan` thresholds are degrees Celsius; `interval` is the poll period in
/// seconds.
pub fn default_template() -> Value {
    json!({
        "version": {
            "number": "1.3.1"
        },
        "user": {
            "username": "picontrol",
            "password": "password",
            "theme": "default"
        },
        "fan": {
            "thresholdOn": 65,
            "thresholdOff": 55,
            "interval": 5
        },
        "button": {
            "option": 1
        },
        "site": {
            "theme": "default",
            "dark_mode": false
        }
    })
}

/// Fan control thresholds and poll interval (`fan` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanSettings {
    /// Fan turns on at or above this temperature (°C)
    pub threshold_on: f32,
    /// Fan turns off at or below this temperature (°C)
    pub threshold_off: f32,
    /// Seconds between controller cycles
    pub interval: u64,
}

impl Default for FanSettings {
    fn default() -> Self {
        Self {
            threshold_on: 65.0,
            threshold_off: 55.0,
            interval: 5,
        }
    }
}

/// Local account settings (`user` section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub username: String,
    pub password: String,
    pub theme: String,
}

/// What the physical button does (`button.option`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ButtonMode {
    /// Classic button layout
    Classic,
    /// Pi-native button layout
    Pi,
}

impl TryFrom<u8> for ButtonMode {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ButtonMode::Classic),
            2 => Ok(ButtonMode::Pi),
            other => Err(format!("button option must be 1 or 2, got {}", other)),
        }
    }
}

impl From<ButtonMode> for u8 {
    fn from(mode: ButtonMode) -> Self {
        match mode {
            ButtonMode::Classic => 1,
            ButtonMode::Pi => 2,
        }
    }
}

/// Button settings (`button` section)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSettings {
    pub option: ButtonMode,
}

/// Web UI presentation settings (`site` section). The daemon does not consume
/// these; they ride along for the UI process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub theme: String,
    pub dark_mode: bool,
}

/// Handle to the on-disk configuration document.
///
/// Constructed once by whatever composes the process and passed to every
/// consumer. Each read goes back to disk, so a settings save from another
/// task is picked up on the controller's next cycle. Concurrent writers are
/// not locked against each other; last write wins.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the resolved default path (env override, XDG, system fallback)
    pub fn at_default_path() -> Self {
        Self::new(paths::config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, creating or repairing the file as needed.
    ///
    /// A missing file is created from the template. An existing file is
    /// parsed, reconciled against the template, and the reconciled result is
    /// written back before being returned. Malformed JSON is an error, never
    /// an implicit reset.
    pub fn load(&self) -> Result<Value> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "config file not found, creating from template");
            let template = default_template();
            self.write_document(&template)?;
            return Ok(template);
        }

        let reconciled = self.read()?;
        self.write_document(&reconciled)?;
        Ok(reconciled)
    }

    /// Parse and reconcile the document without writing the repaired result
    /// back. Used on the controller's per-cycle reads so a healthy file is
    /// not rewritten every few seconds.
    pub fn read(&self) -> Result<Value> {
        let content = fs::read_to_string(&self.path).map_err(|e| PicontrolError::FileRead {
            path: self.path.clone(),
            source: e,
        })?;

        let stored: Value =
            serde_json::from_str(&content).map_err(|e| PicontrolError::ConfigCorrupt {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(reconcile(&default_template(), &stored))
    }

    /// Serialize `doc` and replace the file on disk.
    ///
    /// Write failures surface as [`PicontrolError::ConfigWrite`] rather than a
    /// boolean.
    pub fn save(&self, doc: &Value) -> Result<()> {
        self.write_document(doc)
    }

    /// Load, apply `updater`, save, and return the updated document.
    pub fn update<F>(&self, updater: F) -> Result<Value>
    where
        F: FnOnce(&mut Value),
    {
        let mut doc = self.load()?;
        updater(&mut doc);
        self.save(&doc)?;
        Ok(doc)
    }

    /// Typed view of the `fan` section
    pub fn fan_settings(&self) -> Result<FanSettings> {
        self.section("fan")
    }

    /// Typed view of the `user` section
    pub fn user(&self) -> Result<UserSettings> {
        self.section("user")
    }

    /// Typed view of the `button` section
    pub fn button(&self) -> Result<ButtonSettings> {
        self.section("button")
    }

    /// Typed view of the `site` section
    pub fn site(&self) -> Result<SiteSettings> {
        self.section("site")
    }

    /// Config schema version string
    pub fn version(&self) -> Result<String> {
        let doc = self.read()?;
        doc.pointer("/version/number")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PicontrolError::config("missing version.number"))
    }

    fn section<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let doc = self.read()?;
        let section = doc
            .get(key)
            .cloned()
            .ok_or_else(|| PicontrolError::config(format!("missing config section '{}'", key)))?;

        serde_json::from_value(section).map_err(|e| PicontrolError::InvalidConfig {
            field: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Atomic write: temp file + rename, so a crash mid-write cannot leave a
    /// truncated document behind.
    fn write_document(&self, doc: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PicontrolError::ConfigWrite {
                path: self.path.clone(),
                reason: format!("failed to create config directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(doc).map_err(|e| PicontrolError::ConfigWrite {
            path: self.path.clone(),
            reason: format!("failed to serialize: {}", e),
        })?;

        let temp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path).map_err(|e| PicontrolError::ConfigWrite {
            path: self.path.clone(),
            reason: format!("failed to create temp file: {}", e),
        })?;

        file.write_all(json.as_bytes())
            .map_err(|e| PicontrolError::ConfigWrite {
                path: self.path.clone(),
                reason: format!("failed to write temp file: {}", e),
            })?;

        file.sync_all().map_err(|e| PicontrolError::ConfigWrite {
            path: self.path.clone(),
            reason: format!("failed to sync temp file: {}", e),
        })?;

        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| PicontrolError::ConfigWrite {
            path: self.path.clone(),
            reason: format!("failed to rename temp file: {}", e),
        })
    }
}

/// Merge a stored document with the template.
///
/// Every template key ends up present with a value of the template's type:
/// missing keys, empty strings, and type mismatches reset to the default,
/// nested objects recurse, and anything else from `stored` is kept verbatim,
/// including keys the template does not define. Type mismatch always loses to
/// the default; that is deliberate self-healing against stale documents.
/// Applying this twice yields the same result as applying it once.
pub fn reconcile(template: &Value, stored: &Value) -> Value {
    let (Some(template_map), Some(stored_map)) = (template.as_object(), stored.as_object()) else {
        // A non-object where a section belongs is a type mismatch at this level
        return template.clone();
    };

    let mut merged = stored_map.clone();

    for (key, template_value) in template_map {
        match stored_map.get(key) {
            Some(stored_value)
                if !is_empty_string(stored_value)
                    && same_json_type(stored_value, template_value) =>
            {
                if template_value.is_object() {
                    merged.insert(key.clone(), reconcile(template_value, stored_value));
                }
                // Scalars of the right type are kept as copied
            }
            _ => {
                merged.insert(key.clone(), template_value.clone());
            }
        }
    }

    Value::Object(merged)
}

fn is_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(str::is_empty)
}

/// JSON type classes: null, bool, number, string, array, object. Integer vs
/// float is not distinguished; JSON has a single number type.
fn same_json_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.json"))
    }

    #[test]
    fn reconcile_fills_empty_document() {
        let result = reconcile(&default_template(), &json!({}));
        assert_eq!(result, default_template());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let stored = json!({
            "fan": {"thresholdOn": 70, "interval": "oops"},
            "extra": {"keep": true}
        });
        let once = reconcile(&default_template(), &stored);
        let twice = reconcile(&default_template(), &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn reconcile_covers_every_template_key() {
        let stored = json!({"user": {"username": "alice"}});
        let result = reconcile(&default_template(), &stored);

        for (section, defaults) in default_template().as_object().unwrap() {
            let merged_section = result.get(section).expect("section missing");
            for key in defaults.as_object().unwrap().keys() {
                assert!(
                    merged_section.get(key).is_some(),
                    "missing {}.{}",
                    section,
                    key
                );
            }
        }
        assert_eq!(result["user"]["username"], json!("alice"));
    }

    #[test]
    fn reconcile_preserves_unknown_keys() {
        let stored = json!({
            "fan": {"thresholdOn": 70, "rpm_max": 4200},
            "plugins": ["nfc"]
        });
        let result = reconcile(&default_template(), &stored);
        assert_eq!(result["fan"]["rpm_max"], json!(4200));
        assert_eq!(result["plugins"], json!(["nfc"]));
        assert_eq!(result["fan"]["thresholdOn"], json!(70));
    }

    #[test]
    fn reconcile_resets_type_mismatch_to_default() {
        let stored = json!({"fan": {"interval": "oops"}});
        let result = reconcile(&default_template(), &stored);
        assert_eq!(result["fan"]["interval"], json!(5));
    }

    #[test]
    fn reconcile_resets_empty_string_to_default() {
        let stored = json!({"user": {"username": ""}});
        let result = reconcile(&default_template(), &stored);
        assert_eq!(result["user"]["username"], json!("picontrol"));
    }

    #[test]
    fn reconcile_resets_section_replaced_by_scalar() {
        let stored = json!({"fan": 3});
        let result = reconcile(&default_template(), &stored);
        assert_eq!(result["fan"], default_template()["fan"]);
    }

    #[test]
    fn load_creates_file_with_template() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let doc = store.load().unwrap();
        assert!(store.path().exists());
        assert_eq!(doc["fan"]["thresholdOn"], json!(65));
        assert_eq!(doc, default_template());
    }

    #[test]
    fn load_repairs_existing_file_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"fan": {"interval": "oops"}, "custom": 1}"#).unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc["fan"]["interval"], json!(5));
        assert_eq!(doc["custom"], json!(1));

        // The repaired document landed on disk
        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, doc);
    }

    #[test]
    fn load_surfaces_corrupt_file_without_overwriting() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, PicontrolError::ConfigCorrupt { .. }));
        // The broken file must still be there for the operator to inspect
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "{not json"
        );
    }

    #[test]
    fn save_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut doc = store.load().unwrap();
        doc["fan"]["interval"] = json!(10);
        store.save(&doc).unwrap();

        assert_eq!(store.fan_settings().unwrap().interval, 10);
    }

    #[test]
    fn update_applies_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .update(|doc| doc["user"]["theme"] = json!("midnight"))
            .unwrap();
        assert_eq!(store.user().unwrap().theme, "midnight");
    }

    #[test]
    fn typed_sections_deserialize_from_template() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.load().unwrap();

        let fan = store.fan_settings().unwrap();
        assert_eq!(fan.threshold_on, 65.0);
        assert_eq!(fan.threshold_off, 55.0);
        assert_eq!(fan.interval, 5);

        assert_eq!(store.user().unwrap().username, "picontrol");
        assert_eq!(store.button().unwrap().option, ButtonMode::Classic);
        assert!(!store.site().unwrap().dark_mode);
        assert_eq!(store.version().unwrap(), "1.3.1");
    }

    #[test]
    fn button_mode_rejects_out_of_range_option() {
        let err = serde_json::from_value::<ButtonSettings>(json!({"option": 3}));
        assert!(err.is_err());
    }
}
