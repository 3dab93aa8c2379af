//! Collaboration endpoint URL construction.

use crate::net::collab_client::ClientError;

/// Build the WebSocket URL for a project's collaboration room.
///
/// `http`/`https` bases are upgraded to `ws`/`wss`; `ws`/`wss` bases are
/// used as-is. Any path on the base is kept, trailing slashes dropped.
///
/// # Errors
///
/// Returns [`ClientError::InvalidBaseUrl`] for any other scheme or an
/// empty host.
pub fn endpoint_url(base_url: &str, project_id: &str, token: &str) -> Result<String, ClientError> {
    let base = base_url.trim().trim_end_matches('/');
    let (scheme, rest) = if let Some(rest) = base.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = base.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = base.strip_prefix("ws://") {
        ("ws", rest)
    } else if let Some(rest) = base.strip_prefix("wss://") {
        ("wss", rest)
    } else {
        return Err(ClientError::InvalidBaseUrl(base_url.to_owned()));
    };

    if rest.is_empty() {
        return Err(ClientError::InvalidBaseUrl(base_url.to_owned()));
    }

    Ok(format!(
        "{scheme}://{rest}/ws/collab/{}/?token={}",
        urlencoding::encode(project_id),
        urlencoding::encode(token)
    ))
}

#[cfg(test)]
#[path = "url_test.rs"]
mod tests;
