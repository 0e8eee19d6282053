//! An HTTP service that calculates masses, formulae, and ion series of PNA and peptide sequences

pub mod config;
#[allow(clippy::unused_async)]
mod handlers;
pub mod routes;
pub mod self_check;

// External Crate Imports
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

/// Renders a diagnostic as plain (uncoloured) text, with its source snippet and labels
pub fn render_report(diagnostic: &dyn Diagnostic) -> String {
    render_themed_report(diagnostic, GraphicalTheme::unicode_nocolor())
}

/// Renders a diagnostic with the given `theme`, falling back to its bare message if rendering fails
pub fn render_themed_report(diagnostic: &dyn Diagnostic, theme: GraphicalTheme) -> String {
    let mut buf = String::new();
    let handler = GraphicalReportHandler::new_themed(theme);
    if handler.render_report(&mut buf, diagnostic).is_err() {
        return diagnostic.to_string();
    }
    buf
}

// Module Tests ========================================================================================================
