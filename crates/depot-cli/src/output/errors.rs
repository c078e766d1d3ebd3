//! Error reports for the terminal.

use depot_core::error::DepotError;
use std::error::Error;

use super::colors::ColorSupport;

/// Render `error` with its hint and cause chain
pub fn format_error(colors: &ColorSupport, error: &DepotError) -> String {
    let mut output = format!("{}: {}\n", colors.red("error"), error);

    if let Some(suggestion) = error.suggestion() {
        output.push_str(&format!("\n{}: {}\n", colors.dim("help"), suggestion));
    }

    let mut source = error.source();
    while let Some(cause) = source {
        output.push_str(&format!("\n{}: {}", colors.dim("caused by"), cause));
        source = cause.source();
    }

    output
}
