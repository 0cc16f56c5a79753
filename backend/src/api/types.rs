//! REST API types for the dashboard frontend.
//!
//! Every response is camelCase JSON. Aggregates are embedded as
//! [`DashboardView`] snapshots; NaN totals serialize as `null`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::ServerError;
use crate::models::RawRow;
use crate::session::DashboardView;
use crate::transform::filter::TableQuery;
use crate::transform::normalizer::NormalizeReport;
use crate::transform::pipeline::CsvInfo;

/// Query key holding the free-text search.
pub const SEARCH_PARAM: &str = "search";

/// Prefix of per-column filter keys, e.g. `col.Region=north`.
pub const COLUMN_PARAM_PREFIX: &str = "col.";

/// Current dashboard state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Session identifier, regenerated on every dataset upload
    pub session_id: String,
    pub view: DashboardView,
}

/// Rows of the raw table view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    /// Column headers, in file order
    pub headers: Vec<String>,
    /// Rows before filtering
    pub total_rows: usize,
    /// Rows matching the query
    pub rows: Vec<RawRow>,
}

/// Response sent after a CSV upload replaced the dataset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub session_id: String,
    /// "ready" when every row parsed cleanly, "warning" otherwise
    pub status: String,
    pub csv_info: CsvInfo,
    pub report: NormalizeReport,
    pub view: DashboardView,
}

impl UploadResponse {
    pub fn new(
        session_id: String,
        csv_info: CsvInfo,
        report: NormalizeReport,
        view: DashboardView,
    ) -> Self {
        let status = if report.is_clean() { "ready" } else { "warning" };
        Self {
            session_id,
            status: status.to_string(),
            csv_info,
            report,
            view,
        }
    }
}

/// Build a [`TableQuery`] from `search=` and `col.<name>=` query parameters.
///
/// Other keys are ignored.
pub fn table_query_from_params(params: &HashMap<String, String>) -> TableQuery {
    let mut query = TableQuery::new();
    for (key, value) in params {
        if key == SEARCH_PARAM {
            query.search = Some(value.clone());
        } else if let Some(column) = key.strip_prefix(COLUMN_PARAM_PREFIX) {
            query.columns.insert(column.to_string(), value.clone());
        }
    }
    query
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Load(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, LoadError};
    use crate::session::Dashboard;

    #[test]
    fn test_table_query_from_params() {
        let params: HashMap<String, String> = [
            ("search", "cod"),
            ("col.Region", "north"),
            ("col.Stock Name", "atl"),
            ("page", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let query = table_query_from_params(&params);
        assert_eq!(query.search.as_deref(), Some("cod"));
        assert_eq!(query.columns.len(), 2);
        assert_eq!(query.columns["Region"], "north");
        assert_eq!(query.columns["Stock Name"], "atl");
    }

    #[test]
    fn test_upload_status() {
        let csv_info = CsvInfo {
            encoding: "utf-8".into(),
            delimiter: ',',
            headers: vec!["year".into()],
            row_count: 2,
        };
        let view = Dashboard::default().view();

        let clean = NormalizeReport {
            rows: 2,
            ..NormalizeReport::default()
        };
        let response = UploadResponse::new("id".into(), csv_info.clone(), clean, view.clone());
        assert_eq!(response.status, "ready");

        let dirty = NormalizeReport {
            rows: 2,
            malformed_year: 1,
            malformed_value: 0,
        };
        let response = UploadResponse::new("id".into(), csv_info, dirty, view);
        assert_eq!(response.status, "warning");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["csvInfo"]["rowCount"], 2);
        assert_eq!(json["report"]["malformedYear"], 1);
    }

    #[test]
    fn test_server_error_status() {
        let load: ServerError = LoadError::from(CsvError::EmptyFile).into();
        assert_eq!(load.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ServerError::BadRequest("No file provided".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("join".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let response = load.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_error_response() {
        let body = error_response("Failed to load dataset");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Failed to load dataset");
    }
}
