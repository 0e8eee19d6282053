// Standard Library Imports
use std::sync::Arc;

// External Crate Imports
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use miette::Diagnostic;
use monomers::{BlockKind, BuildingBlock, Formula};
use oligomer::{Features, IonSeries, TerminationSequence};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Local Crate Imports
use crate::{render_report, routes::AppState};

const SERVICE_INFO: &str = "PNA-Peptide Mass Calculation API";

type ApiResult<T> = Result<Json<T>, ApiError>;

// Request and Response Types ==========================================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct SequenceQuery {
    sequence: String,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    info: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

/// One row of the `/building_blocks` listing, with masses exactly as tabulated
#[derive(Serialize)]
pub struct BlockListing<'t> {
    #[serde(rename = "Group")]
    group: &'t str,
    #[serde(rename = "Name")]
    name: &'t str,
    #[serde(rename = "Leaving")]
    leaving: Option<&'t str>,
    #[serde(rename = "MolWt", with = "rust_decimal::serde::float")]
    mol_wt: Decimal,
    #[serde(rename = "Exact", with = "rust_decimal::serde::float")]
    exact: Decimal,
    #[serde(rename = "Formula")]
    formula: String,
}

impl<'t> From<&'t BuildingBlock> for BlockListing<'t> {
    fn from(block: &'t BuildingBlock) -> Self {
        Self {
            group: &block.name,
            name: &block.description,
            leaving: block.leaving.as_deref(),
            mol_wt: block.mol_wt,
            exact: block.exact,
            formula: block.composition.to_string(),
        }
    }
}

// Handlers ============================================================================================================

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        info: SERVICE_INFO,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn building_blocks(State(state): State<Arc<AppState>>) -> Response {
    let listing: IndexMap<BlockKind, Vec<BlockListing>> = state
        .table()
        .by_kind()
        .into_iter()
        .map(|(kind, blocks)| (kind, blocks.into_iter().map(BlockListing::from).collect()))
        .collect();
    // NOTE: Rows borrow from the table, so they're serialized here rather than handed back to `axum`
    Json(listing).into_response()
}

pub async fn mol_wt(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<f64> {
    Ok(Json(state.calculator()?.mol_wt(&query.sequence)?))
}

pub async fn exact(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<f64> {
    Ok(Json(state.calculator()?.exact(&query.sequence)?))
}

pub async fn formula(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<Formula> {
    Ok(Json(state.calculator()?.formula(&query.sequence)?))
}

pub async fn sim_ions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<IonSeries> {
    Ok(Json(state.calculator()?.sim_ions(&query.sequence)?))
}

pub async fn molwt_ions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<IonSeries> {
    Ok(Json(state.calculator()?.mol_wt_ions(&query.sequence)?))
}

pub async fn hrms_ions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<IonSeries> {
    Ok(Json(state.calculator()?.hrms_ions(&query.sequence)?))
}

pub async fn termination_sequences(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<Vec<TerminationSequence>> {
    Ok(Json(
        state
            .calculator()?
            .termination_sequences(&query.sequence)?,
    ))
}

pub async fn all_features(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SequenceQuery>,
) -> ApiResult<Features> {
    Ok(Json(state.calculator()?.features(&query.sequence)?))
}

// Error Responses =====================================================================================================

/// A sequence that couldn't be calculated, reported to the client as `422 Unprocessable Entity`
#[derive(Debug)]
pub struct ApiError(oligomer::Error);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    help: Option<String>,
    report: String,
}

impl From<oligomer::Error> for ApiError {
    fn from(error: oligomer::Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Self(error) = self;
        warn!(%error, "rejected sequence");

        let body = ErrorBody {
            error: error.to_string(),
            help: error.help().map(|help| help.to_string()),
            report: render_report(&error),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}
