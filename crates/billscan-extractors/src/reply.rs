//! Interpretation of the model's chat completion reply.

use billscan_core::{BillscanError, BillscanResult, ExtractedItems};
use serde_json::Value;

/// Text of `choices[0].message.content`.
///
/// A missing `choices`, `message` or `content` key, or a null `content`,
/// reads as `""`. Any other deviation from the chat completion shape is a
/// [`BillscanError::ResponseShape`].
pub fn reply_content(body: &Value) -> BillscanResult<&str> {
    let body = body
        .as_object()
        .ok_or_else(|| BillscanError::response_shape("Response body is not a JSON object"))?;

    let choice = match body.get("choices") {
        None => return Ok(""),
        Some(Value::Array(choices)) => choices
            .first()
            .ok_or_else(|| BillscanError::response_shape("Response contained no choices"))?,
        Some(_) => return Err(BillscanError::response_shape("Response `choices` is not a list")),
    };
    let choice = choice
        .as_object()
        .ok_or_else(|| BillscanError::response_shape("Response choice is not an object"))?;

    let message = match choice.get("message") {
        None => return Ok(""),
        Some(message) => message
            .as_object()
            .ok_or_else(|| BillscanError::response_shape("Response message is not an object"))?,
    };

    match message.get("content") {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(_) => Err(BillscanError::response_shape(
            "Response message content is not a string",
        )),
    }
}

/// Turn reply text into items.
///
/// An empty reply yields an empty list. Text that parses as JSON is used as
/// is, whatever its shape; anything else is kept as raw text.
pub fn interpret_reply(content: &str) -> ExtractedItems {
    if content.is_empty() {
        return ExtractedItems::Structured(Value::Array(Vec::new()));
    }

    match serde_json::from_str::<Value>(content) {
        Ok(value) => ExtractedItems::Structured(value),
        Err(_) => ExtractedItems::RawText(content.to_string()),
    }
}
