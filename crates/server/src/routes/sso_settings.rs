use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use services::services::sso_settings::registry;
use utils::api::sso_settings::{
    ProviderId, ProviderSettings, SsoProvider, UpdateSsoSettingsRequest,
};

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sso-settings", get(list_settings))
        .route(
            "/sso-settings/{provider}",
            get(get_settings).put(update_settings),
        )
}

async fn list_settings(State(state): State<AppState>) -> Json<Vec<SsoProvider>> {
    Json(state.list().await)
}

async fn get_settings(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<SsoProvider>, ApiError> {
    let provider = parse_provider(&provider)?;
    let settings = state
        .get(provider)
        .await
        .ok_or_else(|| ApiError::NotFound("SSO provider not found".to_string()))?;
    Ok(Json(SsoProvider {
        provider: provider.to_string(),
        settings,
    }))
}

async fn update_settings(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<UpdateSsoSettingsRequest>,
) -> Result<StatusCode, ApiError> {
    let provider = parse_provider(&provider)?;
    check_required(provider, &payload.settings)?;
    state.put(provider, payload.settings).await;
    tracing::info!(%provider, "SSO settings updated");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_provider(raw: &str) -> Result<ProviderId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("SSO provider not found".to_string()))
}

/// Rejects the first required form field left blank.
fn check_required(provider: ProviderId, settings: &ProviderSettings) -> Result<(), ApiError> {
    for name in registry::fields_for(provider) {
        let descriptor = registry::describe(name)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if descriptor.required && settings.text(name).trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{name} is required")));
        }
    }
    Ok(())
}
