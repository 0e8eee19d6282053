// Standard Library Imports
use std::sync::Arc;

// External Crate Imports
use axum::{Router, http::Method, routing::get};
use monomers::{BuildingBlockTable, UnknownBlockPolicy};
use oligomer::Calculator;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

// Local Crate Imports
use crate::handlers;

// Public API ==========================================================================================================

/// Shared, read-only state for every request
#[derive(Debug)]
pub struct AppState {
    table: Arc<BuildingBlockTable>,
    unknown_policy: UnknownBlockPolicy,
}

impl AppState {
    /// # Errors
    ///
    /// Fails if the table is missing a block that every calculation needs (the proton adduct or the capping block)
    pub fn new(
        table: Arc<BuildingBlockTable>,
        unknown_policy: UnknownBlockPolicy,
    ) -> oligomer::Result<Self> {
        let state = Self {
            table,
            unknown_policy,
        };
        state.calculator()?;
        Ok(state)
    }

    pub fn table(&self) -> &BuildingBlockTable {
        &self.table
    }

    /// # Errors
    ///
    /// Only fails if the table lacks the adduct or capping block, which [`AppState::new`] has already ruled out
    pub fn calculator(&self) -> oligomer::Result<Calculator<'_>> {
        Ok(Calculator::new(&self.table)?.with_unknown_policy(self.unknown_policy))
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let calc = Router::new()
        .route("/mol_wt", get(handlers::mol_wt))
        .route("/molwt", get(handlers::mol_wt))
        .route("/exact", get(handlers::exact))
        .route("/sim_ions", get(handlers::sim_ions))
        .route("/molwt_ions", get(handlers::molwt_ions))
        .route("/hrms_ions", get(handlers::hrms_ions))
        .route("/formula", get(handlers::formula))
        .route("/termination_sequences", get(handlers::termination_sequences))
        .route("/all_features", get(handlers::all_features));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/building_blocks", get(handlers::building_blocks))
        .nest("/calc", calc)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Module Tests ========================================================================================================
