pub mod error;
pub mod filenames;
pub mod models;
pub mod routes;
pub mod storage;
pub mod upload;

use worker::{Context, Env, Request, Response, Result, event};

#[event(fetch)]
async fn fetch(req: Request, env: Env, ctx: Context) -> Result<Response> {
    routes::handle(req, env, ctx).await
}
