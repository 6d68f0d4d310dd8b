pub mod blob_store;
pub mod prompt;
pub mod relay;
pub mod template;
pub mod upstream;

pub use blob_store::{BlobLease, BlobRecord, BlobStore, BlobSweeper};
pub use relay::RelayState;
pub use upstream::{CompletionClient, OpenAiClient, TokenSource, UpstreamError};
