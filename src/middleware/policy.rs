use axum::{extract::Request, middleware::Next, response::Response};
use futures::future::BoxFuture;
use tracing::warn;

use crate::policy::{authorize, Action, Caller};
use crate::utils::error::AppError;

/// Route layer body that admits the request only if `action` is allowed for
/// the caller resolved by [`super::jwt::jwt_auth`].
pub fn require(
    action: Action,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Result<Response, AppError>> + Clone + Send + Sync + 'static
{
    move |req: Request, next: Next| -> BoxFuture<'static, Result<Response, AppError>> {
        Box::pin(enforce(action, req, next))
    }
}

async fn enforce(action: Action, req: Request, next: Next) -> Result<Response, AppError> {
    let caller = req.extensions().get::<Caller>();

    if let Err(denied) = authorize(caller, action) {
        warn!(?action, caller = ?caller.map(|c| c.id.as_str()), "request denied");
        return Err(denied.into());
    }

    Ok(next.run(req).await)
}
