use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use boothbook_service::BoothServices;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub services: BoothServices,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRequest {
    pub vendor_id: Option<String>,
    pub booth_location: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub vendor_id: Option<String>,
    pub date: Option<String>,
    pub new_booth_location: Option<String>,
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// `POST /api/submit`
pub async fn submit_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let req: SubmitRequest = parse_body(&body)?;
    let [vendor_id, booth_location, date] = required([
        ("vendor_id", &req.vendor_id),
        ("booth_location", &req.booth_location),
        ("date", &req.date),
    ])?;

    let reg = state.services.register(vendor_id, booth_location, date).await?;
    Ok(Json(json!({
        "message": format!(
            "registered {} at {} on {}",
            reg.record.vendor_name, reg.record.booth_location, reg.record.date
        ),
        "data": reg.record,
        "newBoothAdded": reg.new_booth.is_some(),
    })))
}

/// `POST /api/update`
pub async fn update_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let req: UpdateRequest = parse_body(&body)?;
    let [vendor_id, date, new_location] = required([
        ("vendor_id", &req.vendor_id),
        ("date", &req.date),
        ("new_booth_location", &req.new_booth_location),
    ])?;

    let moved = state.services.relocate(vendor_id, date, new_location).await?;
    Ok(Json(json!({
        "message": format!(
            "moved from {} to {}",
            moved.previous_location, moved.record.booth_location
        ),
        "data": moved.record,
        "newBoothAdded": moved.new_booth.is_some(),
    })))
}

/// `POST /api/cleanup`, usually fired by a scheduler. Any body is ignored.
pub async fn cleanup_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state.services.purge_now().await?;
    let message = if report.dropped == 0 {
        format!("nothing to clean up, every record is on or after {}", report.cutoff)
    } else {
        format!("removed {} records dated before {}", report.dropped, report.cutoff)
    };
    Ok(Json(json!({
        "message": message,
        "deleted": report.dropped,
        "remaining": report.kept,
    })))
}

fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

/// Non-empty values of every field, taken verbatim, or a 400 naming the ones
/// missing.
fn required<'a, const N: usize>(fields: [(&str, &'a Option<String>); N]) -> Result<[&'a str; N], ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    Ok(fields.map(|(_, v)| v.as_deref().unwrap_or_default()))
}
