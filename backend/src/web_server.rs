use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::{auth, leads};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub app_config: AppConfig,
}

pub async fn run_server(app_state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        app_state.app_config.web.addr, app_state.app_config.web.port
    )
    .parse()?;
    let app = create_router(app_state);

    tracing::info!("Serving API at http://{}", addr);
    tracing::info!("API docs at http://{}/swagger-ui", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
            layer
        }
    }
}

pub fn create_router(app_state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::login))
        .route("/auth/token/refresh", post(auth::refresh));

    let protected_routes = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/leads", get(leads::list_leads).post(leads::create_lead))
        .route(
            "/leads/{id}",
            get(leads::get_lead)
                .put(leads::update_lead)
                .patch(leads::patch_lead)
                .delete(leads::delete_lead),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::auth_middleware,
        ));

    let cors = cors_layer(&app_state.app_config.web.cors_origin);

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
