//! Search engine integration: document shaping, index bootstrap, and bulk writes.

pub mod documents;
pub mod error;
pub mod indexer;
pub mod service;

pub use documents::{ImageDocument, map_image};
pub use error::SearchError;
pub use indexer::{FlushBuffer, ReindexOptions, ReindexSummary, reindex_images};
pub use service::{BulkFailure, BulkReport, SearchService};
