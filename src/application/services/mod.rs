//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, HttpClient)
//! but are themselves concrete structs, not traits.

mod document;
mod export;
mod sources;
mod sync;

pub use document::{now_timestamp, DataDocument};
pub use export::{
    convert_csv, ExportResponse, ExportService, ExportedNode, EMPTY_SHEET, UNTITLED_ROW,
};
pub use sources::{
    sample_records, DataSource, FallbackSource, FileSource, InjectedSource, LoadedDataset,
    Provenance, SourceChain, SourceData, INJECTED_ENV_VAR,
};
pub use sync::{RemotePayload, SyncOutcome, SyncService, PLACEHOLDER_MARKER};
