//! Flat-file artifacts for a run.
//!
//! Every file goes through [`ArtifactWriter`], which writes to a hidden
//! temporary sibling and renames it into place, then records the size and
//! SHA-256 digest for `manifest.json`.

mod csv;
mod writer;

pub use csv::records_to_csv;
pub use writer::{write_atomic, Artifact, ArtifactWriter, Manifest, MANIFEST_FILE};
