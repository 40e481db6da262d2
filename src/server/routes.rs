use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use crate::schema::{DatabaseSchema, StructureSample, TypeSchema};
use crate::server::AppState;
use crate::storage::{InitOutcome, StoreStatus};
use crate::{Error, ErrorKind, User, WorkspaceData};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

/// An error ready to be sent: status plus `{kind, message}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    fn new(context: &str, err: Error) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::TypeNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        tracing::warn!("{}: {} ({})", context, err, kind);
        Self {
            status,
            kind,
            message: format!("{}: {}", context, err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            kind: self.kind,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    pub path: String,
    #[serde(flatten)]
    pub outcome: InitOutcome,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub oid: i64,
}

#[derive(Serialize)]
pub struct NotFoundMarker {
    pub found: bool,
    pub message: &'static str,
}

/// Run a store call on the blocking pool, one session per call
async fn blocking<T, F>(context: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| ApiError::new(context, e)),
        Err(join_err) => Err(ApiError::new(
            context,
            Error::Session(format!("store worker failed: {}", join_err)),
        )),
    }
}

pub async fn initialize(State(state): State<Arc<AppState>>) -> ApiResult<MessageResponse> {
    let path = state.initializer.path().display().to_string();
    let outcome = blocking("Store initialization failed", move || {
        let _exclusive = state.exclusive();
        state.initializer.initialize(false)
    })
    .await?;
    Ok(Json(MessageResponse {
        message: "Store initialized successfully",
        path,
        outcome,
    }))
}

pub async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<MessageResponse> {
    let path = state.initializer.path().display().to_string();
    let outcome = blocking("Store reset failed", move || {
        let _exclusive = state.exclusive();
        state.initializer.recreate()
    })
    .await?;
    Ok(Json(MessageResponse {
        message: "Store recreated successfully",
        path,
        outcome,
    }))
}

pub async fn delete_store(State(state): State<Arc<AppState>>) -> ApiResult<DeleteResponse> {
    let deleted = blocking("Error deleting store", move || {
        let _exclusive = state.exclusive();
        state.initializer.delete()
    })
    .await?;
    let message = if deleted { "Store deleted" } else { "Store did not exist" };
    Ok(Json(DeleteResponse { message, deleted }))
}

pub async fn get_workspace(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let workspace = blocking("Error retrieving workspace data", move || {
        let _shared = state.shared();
        state.gateway.get_first::<WorkspaceData>()
    })
    .await?;

    Ok(match workspace {
        Some(workspace) => Json(workspace).into_response(),
        None => Json(NotFoundMarker {
            found: false,
            message: "No workspace data found",
        })
        .into_response(),
    })
}

pub async fn get_users(State(state): State<Arc<AppState>>) -> ApiResult<Vec<User>> {
    let users = blocking("Error retrieving users", move || {
        let _shared = state.shared();
        state.gateway.get_all::<User>()
    })
    .await?;
    Ok(Json(users))
}

pub async fn save_workspace(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WorkspaceData>, JsonRejection>,
) -> ApiResult<SaveResponse> {
    let Json(workspace) = payload.map_err(|rejection| {
        ApiError::new(
            "Error saving workspace data",
            Error::InvalidRecord(rejection.body_text()),
        )
    })?;

    let oid = blocking("Error saving workspace data", move || {
        let _shared = state.shared();
        state.gateway.save_workspace(&workspace)
    })
    .await?;
    Ok(Json(SaveResponse {
        message: "Workspace saved",
        oid,
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<StoreStatus> {
    let status = blocking("Error checking store status", move || {
        let _shared = state.shared();
        Ok(state.gateway.status())
    })
    .await?;
    Ok(Json(status))
}

pub async fn database_schema(State(state): State<Arc<AppState>>) -> ApiResult<DatabaseSchema> {
    let schema = blocking("Error retrieving database schema", move || {
        let _shared = state.shared();
        Ok(state.introspector.database_schema())
    })
    .await?;
    Ok(Json(schema))
}

pub async fn type_schema(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<TypeSchema> {
    state
        .introspector
        .require_type_schema(&name)
        .map(Json)
        .map_err(|e| ApiError::new("Error retrieving type schema", e))
}

pub async fn data_structure(
    State(state): State<Arc<AppState>>,
) -> ApiResult<BTreeMap<&'static str, StructureSample>> {
    let structure = blocking("Error retrieving data structure", move || {
        let _shared = state.shared();
        Ok(state.introspector.data_structure())
    })
    .await?;
    Ok(Json(structure))
}

pub async fn available_types(State(state): State<Arc<AppState>>) -> Json<Vec<&'static str>> {
    Json(state.introspector.available_types())
}
