pub mod errors;
pub mod events;
pub mod message;
pub mod session;

pub use errors::AppError;
pub use events::RelayEvent;
pub use message::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
pub use session::{ReasoningMode, RelaySession, StreamQuery};
