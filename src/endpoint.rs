/// HTTP endpoint for well cycle analysis
///
/// Lets external tools (dashboards, notebooks) analyse logger exports
/// without linking the crate.
///
/// Endpoints:
/// - GET  /health                                  - Service health check
/// - GET  /wells                                   - Registry listing
/// - GET  /wells/{well_id}[?format=csv]            - Analyse the configured export
/// - GET  /wells/{well_id}/chart?column={key}      - Level timeline + one cycle column
/// - POST /analyze[?well_id=..&format=csv]         - Analyse a CSV request body

use std::collections::HashMap;
use std::io::Cursor;

use serde::Serialize;
use tiny_http::{Header, Method, Response, StatusCode};
use tracing::{info, warn};

use crate::config::WellRegistry;
use crate::error::{AnalysisError, WellError};
use crate::export::{ColumnPoint, LevelPoint, column_chart_points, cycles_csv_string, level_chart_points};
use crate::model::CycleColumn;
use crate::pipeline::{WellAnalysis, analyze_levels_csv, analyze_registered_well};

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Registry entry for JSON response
#[derive(Debug, Serialize)]
pub struct WellListing {
    pub well_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Chart payload: the level timeline plus one per-cycle column.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub well_id: String,
    pub column: CycleColumn,
    pub label: &'static str,
    pub levels: Vec<LevelPoint>,
    pub values: Vec<ColumnPoint>,
}

/// Response body before it is turned into a tiny_http response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Csv(String),
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes one request. Pure apart from reading registry data files, so it
/// can be tested without a socket.
pub fn route(method: &Method, url: &str, body: &str, registry: &WellRegistry) -> (u16, Body) {
    let (path, query) = split_url(url);

    match (method, path) {
        (Method::Get, "/health") => (200, Body::Json(health())),
        (Method::Get, "/wells") => (200, Body::Json(list_wells(registry))),
        (Method::Get, p) if p.starts_with("/wells/") && p.ends_with("/chart") => {
            let well_id = decode_segment(p.trim_start_matches("/wells/").trim_end_matches("/chart"));
            handle_chart(registry, &well_id, &query)
        }
        (Method::Get, p) if p.starts_with("/wells/") => {
            let well_id = decode_segment(p.trim_start_matches("/wells/"));
            let result = analyze_registered_well(registry, &well_id, None);
            analysis_response(result, &query, registry.analysis.min_drawdown_m)
        }
        (Method::Post, "/analyze") => {
            let well_id = query.get("well_id").map(String::as_str);
            let result = analyze_levels_csv(body, well_id, &registry.analysis, &registry.ingest);
            analysis_response(result, &query, registry.analysis.min_drawdown_m)
        }
        _ => (
            404,
            Body::Json(serde_json::json!({
                "error": "Not found",
                "available_endpoints": [
                    "GET /health",
                    "GET /wells",
                    "GET /wells/{well_id}",
                    "GET /wells/{well_id}/chart?column={column}",
                    "POST /analyze"
                ]
            })),
        ),
    }
}

fn split_url(url: &str) -> (&str, HashMap<String, String>) {
    let (path, raw_query) = url.split_once('?').unwrap_or((url, ""));
    let query = raw_query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key.to_string(), value))
        })
        .collect();
    (path, query)
}

/// Percent-decodes a path segment; undecodable input is used as sent.
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn health() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "service": "wellmon_service",
        "version": env!("CARGO_PKG_VERSION")
    })
}

fn list_wells(registry: &WellRegistry) -> serde_json::Value {
    let wells: Vec<WellListing> = registry
        .wells
        .iter()
        .map(|w| WellListing {
            well_id: w.well_id.clone(),
            name: w.name.clone(),
            description: w.description.clone(),
        })
        .collect();
    to_json(&wells)
}

fn handle_chart(registry: &WellRegistry, well_id: &str, query: &HashMap<String, String>) -> (u16, Body) {
    let key = query.get("column").map(String::as_str).unwrap_or("max_drawdown");
    let Some(column) = CycleColumn::from_key(key) else {
        let keys: Vec<&str> = CycleColumn::ALL.iter().map(|c| c.key()).collect();
        return (
            400,
            Body::Json(serde_json::json!({ "error": format!("unknown column '{}'", key), "columns": keys })),
        );
    };

    match analyze_registered_well(registry, well_id, None) {
        Ok(analysis) => {
            let chart = ChartData {
                well_id: well_id.to_string(),
                column,
                label: column.label(),
                levels: level_chart_points(&analysis.series),
                values: column_chart_points(&analysis.report, column),
            };
            (200, Body::Json(to_json(&chart)))
        }
        Err(e) => error_response(&e),
    }
}

fn analysis_response(
    result: Result<WellAnalysis, WellError>,
    query: &HashMap<String, String>,
    min_drawdown_m: f64,
) -> (u16, Body) {
    let analysis = match result {
        Ok(analysis) => analysis,
        Err(e) => return error_response(&e),
    };

    if query.get("format").map(String::as_str) == Some("csv") {
        return match cycles_csv_string(&analysis.report) {
            Ok(csv) => (200, Body::Csv(csv)),
            Err(e) => error_response(&WellError::Export(e)),
        };
    }

    let mut json = to_json(&analysis);
    if !analysis.has_cycles() {
        json["message"] = serde_json::json!(format!(
            "No valid pumping cycles detected (drawdown < {} m)",
            min_drawdown_m
        ));
    }
    (200, Body::Json(json))
}

fn error_response(e: &WellError) -> (u16, Body) {
    let status = match e {
        WellError::UnknownWell(_) => 404,
        WellError::Ingest(_) => 422,
        WellError::Analysis(AnalysisError::Cancelled) => 503,
        WellError::Analysis(_) => 422,
        _ => 500,
    };
    if status >= 500 {
        warn!(error = %e, "analysis request failed");
    }
    (status, Body::Json(serde_json::json!({ "error": e.to_string() })))
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": format!("serialization failed: {}", e) }))
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port
pub fn start_endpoint_server(port: u16, registry: WellRegistry) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!(port, wells = registry.wells.len(), "HTTP endpoint listening");

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            warn!(error = %e, "failed to read request body");
            let _ = request.respond(create_response(400, Body::Json(serde_json::json!({
                "error": "request body must be UTF-8 text"
            }))));
            continue;
        }

        let (status, response_body) = route(request.method(), request.url(), &body, &registry);
        info!(method = %request.method(), url = request.url(), status, "request");

        if let Err(e) = request.respond(create_response(status, response_body)) {
            warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

/// Create HTTP response with a JSON or CSV body
fn create_response(status_code: u16, body: Body) -> Response<Cursor<Vec<u8>>> {
    let (bytes, content_type): (Vec<u8>, &[u8]) = match body {
        Body::Json(json) => (
            serde_json::to_string_pretty(&json).unwrap_or_default().into_bytes(),
            b"application/json",
        ),
        Body::Csv(csv) => (csv.into_bytes(), b"text/csv; charset=utf-8"),
    };

    let response = Response::from_data(bytes).with_status_code(StatusCode::from(status_code));
    match Header::from_bytes(&b"Content-Type"[..], content_type) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
