mod settings_store;
mod snippets_viewer_settings;

use std::borrow::Cow;

pub use settings_store::{parse_json_with_comments, Settings, SettingsStore};
pub use snippets_viewer_settings::{
    SettingsSource, SnippetsViewerSettings, SnippetsViewerSettingsContent,
};

pub fn default_settings() -> Cow<'static, str> {
    Cow::Borrowed(include_str!("../../../assets/settings/default.json"))
}
