//! Model export and serialization module
//!
//! - [`Blob`]: versioned JSON container handed from stage to stage
//! - [`ModelStore`]: named, checksummed model artifacts on disk

mod blob;
mod store;

pub use blob::{Blob, BlobPayload, PayloadKind, BLOB_FORMAT, BLOB_VERSION};
pub use store::{ModelArtifact, ModelStore};
