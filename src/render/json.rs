//! Pretty-printed JSON output.

use serde_json::Value;

use crate::core::RenderError;

/// Parse `payload` and re-serialize it indented, followed by a newline.
///
/// # Errors
///
/// Returns `RenderError::MalformedPayload` if the payload is not JSON.
pub fn render(payload: &str) -> Result<Vec<u8>, RenderError> {
    let value: Value = serde_json::from_str(payload)?;
    let mut out = serde_json::to_vec_pretty(&value)?;
    out.push(b'\n');
    Ok(out)
}
