//! # dif CLI
//!
//! Command-line interface for the near-duplicate image finder.
//!
//! ## Usage
//! ```bash
//! dif scan ~/Pictures --threshold 0.2
//! dif scan ~/Pictures --high-fidelity --output json
//! dif fingerprint photo.jpg
//! ```

mod cli;

use image_dup_finder::Result;

fn main() -> Result<()> {
    cli::run()
}
