//! Field-driven configuration forms for external identity providers.

pub mod form;
pub mod registry;
pub mod store;
pub mod transform;

pub use form::{FormError, FormPhase, FormView, SsoSettingsForm, SubmitOutcome, ValidationError};
pub use registry::{FieldDescriptor, FieldKind, RegistryError, describe, fields_for};
pub use store::{SettingsSource, SsoSettingsStore};
pub use transform::{FieldValue, ProviderFormState, SelectOption, to_form_state, to_wire};
