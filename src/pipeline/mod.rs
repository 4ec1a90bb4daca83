pub mod conduit;
pub mod counting;
pub mod executor;
pub mod stages;


// Re-exports for convenience
pub use conduit::{conduit, ConduitReader, ConduitWriter, CONDUIT_CHUNK_SIZE};
pub use counting::{ByteCounter, CountingReader};
pub use executor::{StageInput, StageOutput, StreamPipeline, StreamStage, DEFAULT_CONDUIT_CAPACITY};
pub use stages::{RedactStage, UploadStage};
