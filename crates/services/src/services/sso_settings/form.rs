//! Settings form for a single SSO provider.
//!
//! The form owns its values exclusively. Collaborators (settings source,
//! persister, notifier) are injected at construction. A form instance allows
//! one submission at a time: while a save is in flight the submit action is
//! disabled and further submits are rejected without a request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use utils::api::sso_settings::{ProviderId, ProviderSettings, UpdateSsoSettingsRequest};

use super::{
    registry::{self, FieldDescriptor, FieldKind, REQUIRED_MESSAGE, RegistryError},
    store::SettingsSource,
    transform::{FieldValue, ProviderFormState, SelectOption, to_form_state, to_wire},
};
use crate::services::{
    navigation::{NavigationGuard, allow_navigation},
    notifications::{NotificationKind, Notifier},
    sso_client::{SettingsPersister, SsoSettingsClientError},
};

pub const SAVED_MESSAGE: &str = "Settings saved";
pub const DISCARD_HREF: &str = "/admin/authentication";

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("settings for {0} have not been loaded")]
    NotLoaded(ProviderId),
    #[error("field {field} is not part of the {provider} form")]
    FieldNotInForm { provider: ProviderId, field: String },
    #[error("field {field} is not a {expected} field")]
    KindMismatch { field: String, expected: FieldKind },
    #[error("failed to load settings: {0}")]
    Load(#[from] SsoSettingsClientError),
}

/// An unmet required-field constraint, shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, TS)]
#[error("{field}: {message}")]
#[ts(export)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FormPhase {
    Loading,
    Idle,
    Editing,
    Submitting,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved,
    Invalid(Vec<ValidationError>),
    Failed(SsoSettingsClientError),
    /// Another submission of this form is still in flight.
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormView {
    pub provider: ProviderId,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub loading: bool,
    pub dirty: bool,
    pub enabled: bool,
    pub fields: Vec<FieldView>,
    pub submit: SubmitButton,
    pub discard_href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub error: Option<String>,
    pub input: InputView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export)]
pub enum InputView {
    Text {
        value: String,
    },
    MultiSelect {
        tags: Vec<SelectOption>,
        placeholder: Option<String>,
        #[serde(rename = "allowCustomValue")]
        allow_custom_value: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SubmitButton {
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug)]
struct FormInner {
    phase: FormPhase,
    dirty: bool,
    values: ProviderFormState,
    errors: Vec<ValidationError>,
}

pub struct SsoSettingsForm {
    provider: ProviderId,
    fields: &'static [&'static str],
    source: Arc<dyn SettingsSource>,
    persister: Arc<dyn SettingsPersister>,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<FormInner>,
}

impl SsoSettingsForm {
    /// Creates an unloaded form. Fails if the provider's field list does not
    /// resolve in the descriptor table.
    pub fn new(
        provider: ProviderId,
        source: Arc<dyn SettingsSource>,
        persister: Arc<dyn SettingsPersister>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, FormError> {
        registry::descriptors_for(provider)?;
        Ok(Self {
            provider,
            fields: registry::fields_for(provider),
            source,
            persister,
            notifier,
            inner: Mutex::new(FormInner {
                phase: FormPhase::Loading,
                dirty: false,
                values: ProviderFormState::default(),
                errors: Vec::new(),
            }),
        })
    }

    /// Creates a form and populates it from the settings source.
    pub async fn mount(
        provider: ProviderId,
        source: Arc<dyn SettingsSource>,
        persister: Arc<dyn SettingsPersister>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, FormError> {
        let form = Self::new(provider, source, persister, notifier)?;
        form.load().await?;
        Ok(form)
    }

    /// Populates the form, asking the source to load if it has nothing cached
    /// for this provider. Does nothing once the form has been populated.
    pub async fn load(&self) -> Result<(), FormError> {
        if self.phase() != FormPhase::Loading {
            return Ok(());
        }

        let settings = match self.source.settings(self.provider).await {
            Some(settings) => settings,
            None => {
                debug!(provider = %self.provider, "settings not cached, requesting load");
                self.source.load_settings().await?;
                match self.source.settings(self.provider).await {
                    Some(settings) => settings,
                    None => {
                        warn!(provider = %self.provider, "no stored settings, starting empty");
                        ProviderSettings::default()
                    }
                }
            }
        };

        let values = to_form_state(&settings, self.fields)?;
        let mut inner = self.inner();
        if inner.phase == FormPhase::Loading {
            inner.values = values;
            inner.phase = FormPhase::Idle;
            inner.dirty = false;
            inner.errors.clear();
        }
        Ok(())
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn phase(&self) -> FormPhase {
        self.inner().phase
    }

    pub fn is_dirty(&self) -> bool {
        self.inner().dirty
    }

    pub fn values(&self) -> ProviderFormState {
        self.inner().values.clone()
    }

    pub fn errors(&self) -> Vec<ValidationError> {
        self.inner().errors.clone()
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), FormError> {
        self.edit(|values| values.enabled = enabled)
    }

    pub fn set_text(&self, field: &str, value: impl Into<String>) -> Result<(), FormError> {
        let descriptor = self.descriptor(field, FieldKind::Text)?;
        let value = FieldValue::Text(value.into());
        self.edit(|values| values.set(descriptor.name, value))
    }

    /// Appends a free-text tag to a multi-select field. Duplicates are kept.
    pub fn create_tag(&self, field: &str, text: impl Into<String>) -> Result<(), FormError> {
        let descriptor = self.descriptor(field, FieldKind::MultiSelect)?;
        let tag = SelectOption::new(text);
        self.edit(|values| values.push_tag(descriptor.name, tag))
    }

    /// Replaces the tags of a multi-select field, e.g. after one was removed.
    pub fn set_tags(&self, field: &str, tags: Vec<SelectOption>) -> Result<(), FormError> {
        let descriptor = self.descriptor(field, FieldKind::MultiSelect)?;
        self.edit(|values| values.set(descriptor.name, FieldValue::MultiSelect(tags)))
    }

    /// Validates and saves the form.
    pub async fn submit(&self) -> Result<SubmitOutcome, FormError> {
        let (submitted, request) = {
            let mut inner = self.inner();
            match inner.phase {
                FormPhase::Loading => return Err(FormError::NotLoaded(self.provider)),
                FormPhase::Submitting => {
                    debug!(provider = %self.provider, "submit ignored, save in flight");
                    return Ok(SubmitOutcome::AlreadySubmitting);
                }
                FormPhase::Idle | FormPhase::Editing => {}
            }

            let errors = validate(self.fields, &inner.values)?;
            if !errors.is_empty() {
                inner.errors = errors.clone();
                inner.phase = FormPhase::Editing;
                inner.dirty = true;
                return Ok(SubmitOutcome::Invalid(errors));
            }

            let settings = to_wire(&inner.values, self.fields)?;
            inner.errors.clear();
            inner.phase = FormPhase::Submitting;
            (inner.values.clone(), UpdateSsoSettingsRequest { settings })
        };

        info!(provider = %self.provider, "saving SSO settings");
        match self.persister.persist(self.provider, &request).await {
            Ok(()) => {
                self.source
                    .cache(self.provider, request.settings.clone())
                    .await;
                {
                    let mut inner = self.inner();
                    inner.dirty = inner.values != submitted;
                    inner.phase = if inner.dirty {
                        FormPhase::Editing
                    } else {
                        FormPhase::Idle
                    };
                }
                self.notifier
                    .publish(NotificationKind::Success, SAVED_MESSAGE);
                Ok(SubmitOutcome::Saved)
            }
            Err(err) => {
                error!(provider = %self.provider, error = %err, "failed to save SSO settings");
                {
                    let mut inner = self.inner();
                    inner.dirty = true;
                    inner.phase = FormPhase::Editing;
                }
                self.notifier
                    .publish(NotificationKind::Error, &err.notification_message());
                Ok(SubmitOutcome::Failed(err))
            }
        }
    }

    /// Returns true if navigation away from the form may proceed; a dirty
    /// form asks the guard first, whether or not its values are valid.
    pub fn leave(&self, guard: &dyn NavigationGuard) -> bool {
        allow_navigation(self.is_dirty(), guard)
    }

    pub fn render(&self) -> Result<FormView, FormError> {
        let page = registry::page_for(self.provider);
        let inner = self.inner();
        let loading = inner.phase == FormPhase::Loading;
        let submitting = inner.phase == FormPhase::Submitting;

        let fields = self
            .fields
            .iter()
            .map(|name| {
                let descriptor = registry::describe(name)?;
                let error = inner
                    .errors
                    .iter()
                    .find(|e| e.field == descriptor.name)
                    .map(|e| e.message.clone());
                Ok(FieldView {
                    name: descriptor.name.to_string(),
                    label: descriptor.label.to_string(),
                    required: descriptor.required,
                    error,
                    input: input_view(descriptor, inner.values.get(name)),
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        Ok(FormView {
            provider: self.provider,
            title: page.title.to_string(),
            subtitle: page.subtitle.to_string(),
            icon: page.icon.to_string(),
            loading,
            dirty: inner.dirty,
            enabled: inner.values.enabled,
            fields,
            submit: SubmitButton {
                label: String::from(if submitting { "Saving..." } else { "Save" }),
                disabled: loading || submitting,
            },
            discard_href: DISCARD_HREF.to_string(),
        })
    }

    fn descriptor(
        &self,
        field: &str,
        expected: FieldKind,
    ) -> Result<&'static FieldDescriptor, FormError> {
        if !self.fields.iter().any(|name| *name == field) {
            return Err(FormError::FieldNotInForm {
                provider: self.provider,
                field: field.to_string(),
            });
        }
        let descriptor = registry::describe(field)?;
        if descriptor.kind != expected {
            return Err(FormError::KindMismatch {
                field: field.to_string(),
                expected,
            });
        }
        Ok(descriptor)
    }

    fn edit(&self, apply: impl FnOnce(&mut ProviderFormState)) -> Result<(), FormError> {
        let mut inner = self.inner();
        if inner.phase == FormPhase::Loading {
            return Err(FormError::NotLoaded(self.provider));
        }
        apply(&mut inner.values);
        inner.dirty = true;
        if inner.phase == FormPhase::Idle {
            inner.phase = FormPhase::Editing;
        }
        // Once a submit has failed validation, errors track the values live.
        if !inner.errors.is_empty() {
            inner.errors = validate(self.fields, &inner.values)?;
        }
        Ok(())
    }

    fn inner(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(
    fields: &[&str],
    values: &ProviderFormState,
) -> Result<Vec<ValidationError>, RegistryError> {
    let mut errors = Vec::new();
    for name in fields {
        let descriptor = registry::describe(name)?;
        if descriptor.required && values.get(name).is_none_or(FieldValue::is_empty) {
            errors.push(ValidationError {
                field: descriptor.name.to_string(),
                message: descriptor
                    .validation_message
                    .unwrap_or(REQUIRED_MESSAGE)
                    .to_string(),
            });
        }
    }
    Ok(errors)
}

fn input_view(descriptor: &FieldDescriptor, value: Option<&FieldValue>) -> InputView {
    match descriptor.kind {
        FieldKind::Text => InputView::Text {
            value: match value {
                Some(FieldValue::Text(text)) => text.clone(),
                _ => String::new(),
            },
        },
        FieldKind::MultiSelect => InputView::MultiSelect {
            tags: match value {
                Some(FieldValue::MultiSelect(tags)) => tags.clone(),
                _ => Vec::new(),
            },
            placeholder: descriptor.placeholder.map(str::to_string),
            allow_custom_value: descriptor.allow_custom_value,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::{Notify, mpsc::UnboundedReceiver};

    use super::*;
    use crate::services::notifications::{ChannelNotifier, Notification};

    #[derive(Default)]
    struct FakeSource {
        remote: Mutex<Option<ProviderSettings>>,
        cached: Mutex<Option<ProviderSettings>>,
        loads: AtomicUsize,
    }

    impl FakeSource {
        fn cached(settings: ProviderSettings) -> Arc<Self> {
            Arc::new(Self {
                cached: Mutex::new(Some(settings)),
                ..Default::default()
            })
        }

        fn remote(settings: ProviderSettings) -> Arc<Self> {
            Arc::new(Self {
                remote: Mutex::new(Some(settings)),
                ..Default::default()
            })
        }

        fn cached_settings(&self) -> Option<ProviderSettings> {
            self.cached.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SettingsSource for FakeSource {
        async fn load_settings(&self) -> Result<(), SsoSettingsClientError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let remote = self.remote.lock().unwrap().clone();
            *self.cached.lock().unwrap() = remote;
            Ok(())
        }

        async fn settings(&self, _provider: ProviderId) -> Option<ProviderSettings> {
            self.cached_settings()
        }

        async fn is_loading(&self) -> bool {
            false
        }

        async fn cache(&self, _provider: ProviderId, settings: ProviderSettings) {
            *self.cached.lock().unwrap() = Some(settings);
        }
    }

    #[derive(Default)]
    struct RecordingPersister {
        requests: Mutex<Vec<(ProviderId, UpdateSsoSettingsRequest)>>,
        failure: Option<SsoSettingsClientError>,
        gate: Option<Arc<Notify>>,
    }

    impl RecordingPersister {
        fn failing(err: SsoSettingsClientError) -> Self {
            Self {
                failure: Some(err),
                ..Default::default()
            }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SettingsPersister for RecordingPersister {
        async fn persist(
            &self,
            provider: ProviderId,
            request: &UpdateSsoSettingsRequest,
        ) -> Result<(), SsoSettingsClientError> {
            self.requests
                .lock()
                .unwrap()
                .push((provider, request.clone()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    struct Harness {
        form: SsoSettingsForm,
        source: Arc<FakeSource>,
        persister: Arc<RecordingPersister>,
        notifications: UnboundedReceiver<Notification>,
    }

    async fn mount(source: Arc<FakeSource>, persister: RecordingPersister) -> Harness {
        let persister = Arc::new(persister);
        let (notifier, notifications) = ChannelNotifier::new();
        let form = SsoSettingsForm::mount(
            ProviderId::Github,
            source.clone(),
            persister.clone(),
            Arc::new(notifier),
        )
        .await
        .unwrap();
        Harness {
            form,
            source,
            persister,
            notifications,
        }
    }

    fn github_settings() -> ProviderSettings {
        ProviderSettings::new(true)
            .with("clientId", "12345")
            .with("clientSecret", "abcde")
            .with("teamIds", "1,2")
            .with("allowedOrganizations", "grafana")
    }

    fn empty_github_settings() -> ProviderSettings {
        ProviderSettings::new(false)
            .with("clientId", "")
            .with("clientSecret", "")
            .with("teamIds", "")
            .with("allowedOrganizations", "")
    }

    #[tokio::test]
    async fn mount_loads_when_nothing_is_cached() {
        let source = FakeSource::remote(github_settings());
        let h = mount(source.clone(), RecordingPersister::default()).await;

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(h.form.phase(), FormPhase::Idle);
        assert!(!h.form.is_dirty());

        h.form.load().await.unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mount_uses_cached_settings() {
        let source = FakeSource::cached(github_settings());
        let h = mount(source.clone(), RecordingPersister::default()).await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);
        assert_eq!(h.form.values().text("clientId"), Some("12345"));
    }

    #[tokio::test]
    async fn render_populates_every_field_from_loaded_settings() {
        let h = mount(
            FakeSource::cached(github_settings()),
            RecordingPersister::default(),
        )
        .await;
        let view = h.form.render().unwrap();

        assert_eq!(view.title, "GitHub");
        assert!(view.enabled);
        assert!(!view.loading);
        assert_eq!(
            view.submit,
            SubmitButton {
                label: "Save".to_string(),
                disabled: false,
            }
        );
        assert_eq!(view.discard_href, DISCARD_HREF);

        let names: Vec<_> = view.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["clientId", "clientSecret", "teamIds", "allowedOrganizations"]
        );
        assert_eq!(
            view.fields[0].input,
            InputView::Text {
                value: "12345".to_string()
            }
        );
        assert_eq!(
            view.fields[2].input,
            InputView::MultiSelect {
                tags: vec![SelectOption::new("1"), SelectOption::new("2")],
                placeholder: Some("Enter team IDs and press Enter to add".to_string()),
                allow_custom_value: true,
            }
        );
        for field in &view.fields {
            let populated = match &field.input {
                InputView::Text { value } => !value.is_empty(),
                InputView::MultiSelect { tags, .. } => !tags.is_empty(),
            };
            assert!(populated, "{} left empty", field.name);
        }
    }

    #[tokio::test]
    async fn unloaded_form_is_read_only() {
        let (notifier, _rx) = ChannelNotifier::new();
        let form = SsoSettingsForm::new(
            ProviderId::Github,
            FakeSource::remote(github_settings()),
            Arc::new(RecordingPersister::default()),
            Arc::new(notifier),
        )
        .unwrap();

        let view = form.render().unwrap();
        assert!(view.loading);
        assert!(view.submit.disabled);
        assert!(matches!(
            form.set_text("clientId", "x"),
            Err(FormError::NotLoaded(ProviderId::Github))
        ));
        assert!(matches!(
            form.submit().await,
            Err(FormError::NotLoaded(ProviderId::Github))
        ));
    }

    #[tokio::test]
    async fn empty_required_fields_block_submit() {
        let mut h = mount(
            FakeSource::cached(empty_github_settings()),
            RecordingPersister::default(),
        )
        .await;

        let errors = match h.form.submit().await.unwrap() {
            SubmitOutcome::Invalid(errors) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "clientId");
        assert_eq!(errors[1].field, "clientSecret");
        assert_eq!(h.persister.calls(), 0);
        assert!(h.notifications.try_recv().is_err());
        assert_eq!(h.form.phase(), FormPhase::Editing);
        assert!(h.form.is_dirty());

        let view = h.form.render().unwrap();
        let inline: Vec<_> = view.fields.iter().filter_map(|f| f.error.clone()).collect();
        assert_eq!(inline, vec![REQUIRED_MESSAGE, REQUIRED_MESSAGE]);
    }

    #[tokio::test]
    async fn whitespace_only_values_are_blank() {
        let h = mount(
            FakeSource::cached(empty_github_settings()),
            RecordingPersister::default(),
        )
        .await;
        h.form.set_text("clientId", "   ").unwrap();
        h.form.set_text("clientSecret", "secret").unwrap();

        let errors = match h.form.submit().await.unwrap() {
            SubmitOutcome::Invalid(errors) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        };
        assert_eq!(
            errors,
            vec![ValidationError {
                field: "clientId".to_string(),
                message: REQUIRED_MESSAGE.to_string(),
            }]
        );
        assert_eq!(h.persister.calls(), 0);
    }

    #[tokio::test]
    async fn validation_errors_follow_edits() {
        let h = mount(
            FakeSource::cached(empty_github_settings()),
            RecordingPersister::default(),
        )
        .await;
        h.form.submit().await.unwrap();
        assert_eq!(h.form.errors().len(), 2);

        h.form.set_text("clientId", "id").unwrap();
        assert_eq!(
            h.form.errors(),
            vec![ValidationError {
                field: "clientSecret".to_string(),
                message: REQUIRED_MESSAGE.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn github_submit_sends_comma_joined_tags() {
        let mut h = mount(
            FakeSource::cached(empty_github_settings()),
            RecordingPersister::default(),
        )
        .await;

        h.form.set_text("clientId", "test-client-id").unwrap();
        h.form
            .set_text("clientSecret", "test-client-secret")
            .unwrap();
        h.form.create_tag("teamIds", "test-team").unwrap();
        h.form
            .create_tag("allowedOrganizations", "test-org1")
            .unwrap();
        h.form
            .create_tag("allowedOrganizations", "test-org2")
            .unwrap();
        assert!(h.form.is_dirty());
        assert_eq!(h.form.phase(), FormPhase::Editing);

        assert!(matches!(
            h.form.submit().await.unwrap(),
            SubmitOutcome::Saved
        ));

        let requests = h.persister.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let (provider, request) = &requests[0];
        assert_eq!(*provider, ProviderId::Github);
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "settings": {
                    "clientId": "test-client-id",
                    "clientSecret": "test-client-secret",
                    "teamIds": "test-team",
                    "allowedOrganizations": "test-org1,test-org2",
                    "enabled": false,
                }
            })
        );

        assert_eq!(
            h.notifications.try_recv().unwrap(),
            Notification {
                kind: NotificationKind::Success,
                message: SAVED_MESSAGE.to_string(),
            }
        );
        assert!(!h.form.is_dirty());
        assert_eq!(h.form.phase(), FormPhase::Idle);
        assert_eq!(h.source.cached_settings(), Some(request.settings.clone()));
    }

    #[tokio::test]
    async fn submit_is_single_flight() {
        let gate = Arc::new(Notify::new());
        let h = mount(
            FakeSource::cached(github_settings()),
            RecordingPersister::gated(gate.clone()),
        )
        .await;

        let second = async {
            while h.form.phase() != FormPhase::Submitting {
                tokio::task::yield_now().await;
            }
            let outcome = h.form.submit().await.unwrap();
            let view = h.form.render().unwrap();
            assert_eq!(view.submit.label, "Saving...");
            assert!(view.submit.disabled);
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(h.form.submit(), second);

        assert!(matches!(first.unwrap(), SubmitOutcome::Saved));
        assert!(matches!(second, SubmitOutcome::AlreadySubmitting));
        assert_eq!(h.persister.calls(), 1);
        assert_eq!(h.form.render().unwrap().submit.label, "Save");
    }

    #[tokio::test]
    async fn persist_failure_keeps_values_for_retry() {
        let mut h = mount(
            FakeSource::cached(github_settings()),
            RecordingPersister::failing(SsoSettingsClientError::Http {
                status: 400,
                body: r#"{"message":"Invalid client secret"}"#.to_string(),
            }),
        )
        .await;
        h.form.set_text("clientSecret", "wrong").unwrap();
        let before = h.form.values();

        let outcome = h.form.submit().await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(SsoSettingsClientError::Http { status: 400, .. })
        ));
        assert_eq!(
            h.notifications.try_recv().unwrap(),
            Notification {
                kind: NotificationKind::Error,
                message: "Invalid client secret".to_string(),
            }
        );
        assert!(h.notifications.try_recv().is_err());
        assert_eq!(h.form.values(), before);
        assert!(h.form.is_dirty());
        assert_eq!(h.form.phase(), FormPhase::Editing);
        assert_eq!(h.source.cached_settings(), Some(github_settings()));

        h.form.submit().await.unwrap();
        assert_eq!(h.persister.calls(), 2);
    }

    #[tokio::test]
    async fn transport_failure_uses_error_text() {
        let mut h = mount(
            FakeSource::cached(github_settings()),
            RecordingPersister::failing(SsoSettingsClientError::Transport(
                "connection refused".to_string(),
            )),
        )
        .await;
        h.form.submit().await.unwrap();
        assert_eq!(
            h.notifications.try_recv().unwrap().message,
            "network error: connection refused"
        );
    }

    #[tokio::test]
    async fn created_tags_keep_duplicates() {
        let h = mount(
            FakeSource::cached(empty_github_settings()),
            RecordingPersister::default(),
        )
        .await;
        h.form.create_tag("teamIds", "a").unwrap();
        h.form.create_tag("teamIds", "a").unwrap();
        assert_eq!(
            h.form.values().tags("teamIds").unwrap(),
            &[SelectOption::new("a"), SelectOption::new("a")]
        );

        h.form.set_tags("teamIds", Vec::new()).unwrap();
        assert_eq!(h.form.values().tags("teamIds"), Some(&[][..]));
    }

    #[tokio::test]
    async fn edits_are_checked_against_the_form() {
        let h = mount(
            FakeSource::cached(github_settings()),
            RecordingPersister::default(),
        )
        .await;
        assert!(matches!(
            h.form.set_text("scopes", "openid"),
            Err(FormError::FieldNotInForm { .. })
        ));
        assert!(matches!(
            h.form.set_text("teamIds", "1"),
            Err(FormError::KindMismatch {
                expected: FieldKind::Text,
                ..
            })
        ));
        assert!(matches!(
            h.form.create_tag("clientId", "x"),
            Err(FormError::KindMismatch {
                expected: FieldKind::MultiSelect,
                ..
            })
        ));
        assert!(!h.form.is_dirty());
    }

    #[tokio::test]
    async fn leaving_prompts_only_when_dirty() {
        let h = mount(
            FakeSource::cached(github_settings()),
            RecordingPersister::default(),
        )
        .await;
        let prompts = AtomicUsize::new(0);
        let decline = || {
            prompts.fetch_add(1, Ordering::SeqCst);
            false
        };

        assert!(h.form.leave(&decline));
        assert_eq!(prompts.load(Ordering::SeqCst), 0);

        h.form.set_enabled(false).unwrap();
        assert!(!h.form.leave(&decline));
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert!(h.form.leave(&|| true));
    }
}
