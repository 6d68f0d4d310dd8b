//! Builds the user message sent upstream, with or without an attached image

use super::blob_store::{BlobRecord, BlobStore};
use crate::types::{AppError, ChatMessage, ContentPart, ImageUrl, MessageContent};

/// Resolve `blob_id` against the store and build the user message.
///
/// Does not touch the store beyond a lookup.
pub fn compose(
    store: &BlobStore,
    prompt: &str,
    blob_id: Option<&str>,
    supports_vision: bool,
) -> Result<ChatMessage, AppError> {
    let record = match blob_id {
        Some(id) => Some(store.get(id).ok_or_else(|| AppError::BlobExpiredOrMissing {
            id: id.to_string(),
        })?),
        None => None,
    };

    Ok(user_message(prompt, record.as_deref(), supports_vision))
}

pub fn user_message(prompt: &str, image: Option<&BlobRecord>, supports_vision: bool) -> ChatMessage {
    let content = match image {
        None => MessageContent::Text(prompt.to_string()),
        Some(record) if supports_vision => MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: record.data_uri(),
                },
            },
        ]),
        Some(record) => MessageContent::Text(inline_image_text(prompt, record)),
    };

    ChatMessage::user(content)
}

/// Fallback for models without image input: the encoded image goes in as text
fn inline_image_text(prompt: &str, record: &BlobRecord) -> String {
    format!(
        "{prompt}\n\n[Attached image: {mime}, approximately {size} bytes, base64-encoded]\n{data}",
        mime = record.mime_type,
        size = record.approx_decoded_len(),
        data = record.payload,
    )
}
