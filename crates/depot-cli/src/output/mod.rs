//! Terminal output for the non-server commands.

pub mod colors;
pub mod errors;

use depot_core::error::DepotError;

use colors::ColorSupport;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
}

impl OutputHandler {
    /// Create a handler that colors output when attached to a terminal
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Print a plain line
    pub fn info(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a de-emphasised line
    pub fn detail(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print a failed command's error to stderr
    pub fn report(&self, error: &DepotError) {
        eprintln!("{}", errors::format_error(&self.colors, error));
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
