use std::collections::HashMap;

use serde::Serialize;
use worker::{Context, Env, FormEntry, Request, Response, Result, RouteContext, Router};

use crate::error::ApiError;
use crate::filenames::is_safe_download_name;
use crate::models::DEFAULT_STORAGE_ROOT;
use crate::{storage, upload};

#[derive(Debug, Clone)]
pub struct AppState {
    pub storage_root: String,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let storage_root = env
        .var("STORAGE_ROOT")
        .map(|value| value.to_string())
        .unwrap_or_else(|_| DEFAULT_STORAGE_ROOT.to_string());

    let state = AppState { storage_root };

    Router::with_data(state)
        .post_async("/upload", upload_route)
        .get_async("/download", download_route)
        .run(req, env)
        .await
}

async fn upload_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match upload_response(&mut req, &ctx.data.storage_root).await {
        Ok(response) => json_response(&response),
        Err(error) => {
            if error.status_code() >= 500 {
                worker::console_error!("upload failed: {error}");
            }
            error.into_response()
        }
    }
}

async fn download_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match download_response(&req, &ctx.data.storage_root).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

async fn upload_response(
    req: &mut Request,
    storage_root: &str,
) -> Result<crate::models::UploadResponse, ApiError> {
    let form = req.form_data().await?;

    let Some(FormEntry::File(file)) = form.get("file") else {
        return Err(ApiError::BadRequest("No file part".to_string()));
    };
    let password = match form.get("password") {
        Some(FormEntry::Field(value)) => Some(value),
        _ => None,
    };

    let filename = file.name();
    let bytes = file.bytes().await?;

    upload::process_upload(storage_root, &filename, &bytes, password.as_deref()).await
}

async fn download_response(req: &Request, storage_root: &str) -> Result<Response, ApiError> {
    let query = parse_query(req)?;
    let filename = query
        .get("filename")
        .ok_or_else(|| ApiError::BadRequest("filename query parameter is required".to_string()))?;
    if !is_safe_download_name(filename) {
        return Err(ApiError::BadRequest("invalid filename".to_string()));
    }

    let bytes = storage::get_bytes(storage_root, filename)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{filename} not found")))?;

    let mut response = Response::from_bytes(bytes)?;
    response
        .headers_mut()
        .set("Content-Type", content_type_for(filename))?;
    response.headers_mut().set(
        "Content-Disposition",
        &format!("attachment; filename=\"{filename}\""),
    )?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

pub fn content_type_for(filename: &str) -> &'static str {
    if filename.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "text/csv; charset=utf-8"
    }
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn parse_query(req: &Request) -> Result<HashMap<String, String>, ApiError> {
    let url = req.url()?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}
