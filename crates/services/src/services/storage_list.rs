//! Card view model for the read-only list of storage roots.

use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;
use utils::api::storage::RootStorageMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BadgeColor {
    Green,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct StorageCard {
    pub heading: String,
    pub badge: String,
    pub badge_color: BadgeColor,
    pub meta: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct StorageListView {
    pub title: String,
    pub cards: Vec<StorageCard>,
}

pub fn icon_name(storage_type: &str) -> &'static str {
    match storage_type {
        "git" => "code-branch",
        "sql" => "database",
        _ => "folder-open",
    }
}

/// Disk path, else git remote, else the SQL settings, else empty.
pub fn description(storage: &RootStorageMeta) -> String {
    let config = &storage.config;
    if let Some(disk) = &config.disk {
        return disk.path.clone();
    }
    if let Some(git) = &config.git {
        return git.remote.clone();
    }
    match &config.sql {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(sql)) => sql.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn storage_card(storage: &RootStorageMeta) -> StorageCard {
    let (badge, badge_color) = if storage.ready {
        ("Ready", BadgeColor::Green)
    } else {
        ("Not ready", BadgeColor::Red)
    };
    StorageCard {
        heading: storage.config.name.clone(),
        badge: badge.to_string(),
        badge_color,
        meta: storage.config.prefix.clone(),
        description: description(storage),
        icon: icon_name(&storage.config.storage_type).to_string(),
    }
}

pub fn storage_list(title: impl Into<String>, storage: &[RootStorageMeta]) -> StorageListView {
    StorageListView {
        title: title.into(),
        cards: storage.iter().map(storage_card).collect(),
    }
}
