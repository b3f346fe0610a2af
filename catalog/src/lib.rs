//! Reference-track catalog.
//!
//! [`CatalogBuilder`] runs every [`TrackSource`] through feature extraction
//! and the embedding model, producing a [`CatalogIndex`]. The index records
//! the model version it was built with and refuses to load under any other.

mod builder;
mod error;
mod index;
mod label;
mod source;

pub use builder::{BuildReport, CatalogBuilder, SkippedTrack};
pub use error::CatalogError;
pub use index::{CATALOG_FORMAT, CATALOG_FORMAT_VERSION, CatalogEntry, CatalogIndex};
pub use label::{TrackLabel, UNKNOWN_ARTIST, parse_track_label};
pub use source::{AUDIO_EXTENSIONS, AudioSource, TrackSource, sources_from_dir, sources_from_manifest};
