/// Fallback for RPC methods without a dedicated handler
///
/// Game methods (`ShowGames`, `GetGame`, `MakeMove`) are declared in the
/// method table and answer `501 unimplemented`; any name missing from the
/// table answers `404 not_found`. Request bodies are ignored.

use crate::{
    error::{ApiError, ApiResult},
    rpc::{self, Capability},
};
use axum::{extract::Path, Json};
use tracing::{debug, warn};

/// Handles `POST /rpc/:method` for methods without a route of their own
pub async fn dispatch(Path(method): Path<String>) -> ApiResult<Json<()>> {
    match rpc::lookup(&method) {
        Some(declared) if declared.capability == Capability::NotYetImplemented => {
            debug!(method = %method, "Unimplemented RPC called");
            Err(ApiError::Unimplemented(method))
        }
        Some(_) => {
            // Implemented methods are routed explicitly; reaching here means
            // the router and the method table disagree.
            warn!(method = %method, "Implemented RPC has no route");
            Err(ApiError::InternalError(format!("No route for {}", method)))
        }
        None => Err(ApiError::NotFound(format!("Unknown method {}", method))),
    }
}
