use worker::{Cache, Response};

use crate::error::ApiError;

/// Key under which a stored file lives, scoped by the configured root.
pub fn storage_url(root: &str, filename: &str) -> String {
    format!(
        "https://storage.local/{}/{}",
        urlencoding::encode(root),
        urlencoding::encode(filename)
    )
}

pub async fn get_bytes(root: &str, filename: &str) -> Result<Option<Vec<u8>>, ApiError> {
    let cache = Cache::default();
    let mut cached = cache.get(storage_url(root, filename), true).await?;

    let Some(mut response) = cached.take() else {
        return Ok(None);
    };

    let payload = response.bytes().await?;
    Ok(Some(payload))
}

pub async fn put_bytes(
    root: &str,
    filename: &str,
    bytes: &[u8],
    ttl_seconds: u32,
    content_type: &str,
) -> Result<(), ApiError> {
    let cache = Cache::default();
    let mut response = Response::from_bytes(bytes.to_vec())?;
    response
        .headers_mut()
        .set("Cache-Control", &format!("public, max-age={ttl_seconds}"))?;
    response.headers_mut().set("Content-Type", content_type)?;

    cache.put(storage_url(root, filename), response).await?;
    Ok(())
}
