//! # altesse CLI
//!
//! Command-line interface for the batch tools.
//!
//! ## Usage
//! ```bash
//! altesse scan ~/Downloads --output json
//! altesse clean ~/Downloads --dry-run
//! altesse convert photos/*.png --out-dir out --format webp
//! ```

mod cli;

use altesse_tools::Result;

fn main() -> Result<()> {
    cli::run()
}
