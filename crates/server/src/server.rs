use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use std::sync::Arc;

use crate::{claim_sheets, expenses};
use api_types::health::Health;
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(unauthorized());
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(unauthorized());
    }

    let user = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to look up user: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        })?;

    let Some(user) = user else {
        tracing::debug!(user = auth_header.username(), "rejected credentials");
        return Err(unauthorized());
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"claimsheets\"")],
    )
        .into_response()
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, std::io::Error> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin = HeaderValue::from_str(origin).map_err(|err| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid CORS origin {origin:?}: {err}"),
        )
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Build the HTTP API. Every route but `/api/health` needs Basic auth.
///
/// Without `cors_origin` any origin is allowed.
pub fn router(state: ServerState, cors_origin: Option<&str>) -> Result<Router, std::io::Error> {
    let api = Router::new()
        .route(
            "/claim-sheets",
            get(claim_sheets::list).post(claim_sheets::create),
        )
        .route(
            "/claim-sheets/{id}",
            get(claim_sheets::get)
                .put(claim_sheets::update)
                .delete(claim_sheets::delete),
        )
        .route("/claim-sheets/{id}/export", get(claim_sheets::export))
        .route(
            "/expenses/claim-sheet/{claim_sheet_id}",
            get(expenses::list_by_claim_sheet),
        )
        .route("/expenses", post(expenses::create))
        .route("/expenses/batch", post(expenses::create_batch))
        .route(
            "/expenses/reorder/{claim_sheet_id}",
            put(expenses::reorder),
        )
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/health", get(health))
        .with_state(state);

    Ok(Router::new()
        .nest("/api", api)
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http()))
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
    cors_origin: Option<String>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };
    let app = router(state, cors_origin.as_deref())?;

    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
    cors_origin: Option<String>,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener, cors_origin).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
