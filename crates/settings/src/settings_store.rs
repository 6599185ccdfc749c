use anyhow::{anyhow, Context as _, Result};
use fs::Fs;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// A value that can be defined as a user setting.
///
/// Settings are loaded from the built-in default settings document, with the
/// user's settings document layered on top.
pub trait Settings: 'static + Send + Sync {
    /// The dotted path of the object within the JSON file from which this
    /// setting should be deserialized. If this is `None`, then the setting
    /// will be deserialized from the root object.
    const KEY: Option<&'static str>;

    /// The type that is stored in an individual JSON file.
    type FileContent: Clone + Default + Serialize + DeserializeOwned;

    /// The logic for combining together values from one or more JSON files
    /// into the final value for this setting.
    fn load(default_value: &Self::FileContent, user_values: &[&Self::FileContent]) -> Result<Self>
    where
        Self: Sized;

    fn load_via_json_merge(
        default_value: &Self::FileContent,
        user_values: &[&Self::FileContent],
    ) -> Result<Self>
    where
        Self: DeserializeOwned,
    {
        let mut merged = serde_json::Value::Null;
        for value in [default_value].iter().chain(user_values) {
            merge_non_null_json_value_into(serde_json::to_value(value)?, &mut merged);
        }
        Ok(serde_json::from_value(merged)?)
    }
}

/// Holds the default and user settings documents and resolves strongly-typed
/// settings out of them.
pub struct SettingsStore {
    default_deserialized_settings: serde_json::Value,
    user_deserialized_settings: serde_json::Value,
}

impl Default for SettingsStore {
    fn default() -> Self {
        SettingsStore {
            default_deserialized_settings: serde_json::json!({}),
            user_deserialized_settings: serde_json::json!({}),
        }
    }
}

impl SettingsStore {
    pub fn new(default_settings_content: &str) -> Result<Self> {
        let mut store = Self::default();
        store.set_default_settings(default_settings_content)?;
        Ok(store)
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn test() -> Self {
        Self::new(&crate::default_settings()).unwrap()
    }

    pub fn set_default_settings(&mut self, default_settings_content: &str) -> Result<()> {
        let settings = parse_settings_document(default_settings_content)?;
        if !settings.is_object() {
            return Err(anyhow!("settings must be an object"));
        }
        self.default_deserialized_settings = settings;
        Ok(())
    }

    /// Replaces the user settings. Empty content clears them.
    pub fn set_user_settings(&mut self, user_settings_content: &str) -> Result<()> {
        let settings = parse_settings_document(user_settings_content)?;
        if !settings.is_object() {
            return Err(anyhow!("settings must be an object"));
        }
        self.user_deserialized_settings = settings;
        Ok(())
    }

    /// Reads the user settings file through `fs`. A missing file leaves the
    /// user layer empty.
    pub async fn load_user_settings(&mut self, fs: &dyn Fs, path: &Path) -> Result<()> {
        if !fs.is_file(path).await {
            log::debug!("no user settings at {}", path.display());
            return self.set_user_settings("");
        }
        let content = fs
            .load(path)
            .await
            .with_context(|| format!("failed to load settings file {}", path.display()))?;
        self.set_user_settings(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn get<T: Settings>(&self) -> Result<T> {
        let default_value = deserialize_setting::<T>(&self.default_deserialized_settings)
            .with_context(|| format!("invalid default value for {:?}", T::KEY))?;
        let user_value = deserialize_setting::<T>(&self.user_deserialized_settings)
            .with_context(|| format!("invalid user value for {:?}", T::KEY))?;
        T::load(&default_value, &[&user_value])
    }
}

fn deserialize_setting<T: Settings>(json: &serde_json::Value) -> Result<T::FileContent> {
    let value = match T::KEY {
        Some(key) => key
            .split('.')
            .try_fold(json, |value, segment| value.get(segment)),
        None => Some(json),
    };
    match value {
        Some(value) => Ok(serde_json::from_value(value.clone())?),
        None => Ok(T::FileContent::default()),
    }
}

fn parse_settings_document(content: &str) -> Result<serde_json::Value> {
    if content.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    let settings: serde_json::Value = parse_json_with_comments(content)?;
    Ok(expand_dotted_keys(settings))
}

/// Turns top-level keys such as `"snippets.viewer.userOnly": true` into the
/// nested form `{"snippets": {"viewer": {"userOnly": true}}}`, so both
/// spellings resolve the same setting.
fn expand_dotted_keys(value: serde_json::Value) -> serde_json::Value {
    let serde_json::Value::Object(map) = value else {
        return value;
    };
    let mut expanded = serde_json::Value::Object(Default::default());
    for (key, value) in map {
        let mut nested = value;
        for segment in key.rsplit('.') {
            let mut object = serde_json::Map::new();
            object.insert(segment.to_string(), nested);
            nested = serde_json::Value::Object(object);
        }
        merge_non_null_json_value_into(nested, &mut expanded);
    }
    expanded
}

pub fn merge_non_null_json_value_into(source: serde_json::Value, target: &mut serde_json::Value) {
    use serde_json::Value;
    if let Value::Object(source_object) = source {
        if !target.is_object() {
            *target = Value::Object(Default::default());
        }
        let Value::Object(target_object) = target else {
            return;
        };
        for (key, value) in source_object {
            if let Some(target) = target_object.get_mut(&key) {
                merge_non_null_json_value_into(value, target);
            } else if !value.is_null() {
                target_object.insert(key, value);
            }
        }
    } else if !source.is_null() {
        *target = source
    }
}

pub fn parse_json_with_comments<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_json_lenient::from_str_lenient(content)?)
}
