//! Conversion between the flat wire settings and the in-form state.
//!
//! Multi-select values are comma-joined on the wire. Commas inside a tag are
//! not escaped, so such a tag comes back as several tags after a reload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::api::sso_settings::ProviderSettings;

use super::registry::{self, FieldKind, RegistryError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    /// A tag whose label is its value, as created from free text.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum FieldValue {
    Text(String),
    MultiSelect(Vec<SelectOption>),
}

impl FieldValue {
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::MultiSelect => FieldValue::MultiSelect(Vec::new()),
        }
    }

    /// Whitespace-only text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::MultiSelect(tags) => tags.is_empty(),
        }
    }

    fn to_wire_string(&self) -> String {
        match self {
            FieldValue::Text(value) => value.clone(),
            FieldValue::MultiSelect(tags) => tags
                .iter()
                .map(|tag| tag.value.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Values of one provider form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProviderFormState {
    pub enabled: bool,
    pub values: BTreeMap<String, FieldValue>,
}

impl ProviderFormState {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn tags(&self, name: &str) -> Option<&[SelectOption]> {
        match self.values.get(name) {
            Some(FieldValue::MultiSelect(tags)) => Some(tags),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Appends a tag, creating the list if the field had none. Duplicates are kept.
    pub(crate) fn push_tag(&mut self, name: &str, tag: SelectOption) {
        match self.values.get_mut(name) {
            Some(FieldValue::MultiSelect(tags)) => tags.push(tag),
            _ => self.set(name, FieldValue::MultiSelect(vec![tag])),
        }
    }
}

fn split_tags(raw: &str) -> Vec<SelectOption> {
    raw.split(',')
        .filter(|segment| !segment.is_empty())
        .map(SelectOption::new)
        .collect()
}

pub fn to_form_state(
    wire: &ProviderSettings,
    fields: &[&str],
) -> Result<ProviderFormState, RegistryError> {
    let mut state = ProviderFormState {
        enabled: wire.enabled,
        values: BTreeMap::new(),
    };
    for name in fields {
        let descriptor = registry::describe(name)?;
        let raw = wire.text(name);
        let value = match descriptor.kind {
            FieldKind::Text => FieldValue::Text(raw),
            FieldKind::MultiSelect => FieldValue::MultiSelect(split_tags(&raw)),
        };
        state.set(name, value);
    }
    Ok(state)
}

/// Builds the wire settings for `fields`; keys outside the list are not sent.
pub fn to_wire(
    form: &ProviderFormState,
    fields: &[&str],
) -> Result<ProviderSettings, RegistryError> {
    let mut wire = ProviderSettings::new(form.enabled);
    for name in fields {
        let descriptor = registry::describe(name)?;
        let value = form
            .get(name)
            .map(FieldValue::to_wire_string)
            .unwrap_or_else(|| FieldValue::empty(descriptor.kind).to_wire_string());
        wire.insert(*name, value);
    }
    Ok(wire)
}
