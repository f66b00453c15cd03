use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use prometheus::{Encoder, TextEncoder};

use crate::api::{HttpErrorInfo, MovieAggregate, ServiceError};
use crate::composite::{HealthAggregator, HealthStatus, MovieCompositeService};

// ============================================================================
// REST Surface
// ============================================================================
//
// What the composite service exposes upward:
//   GET    /movie-composite/{movieId}   read the aggregate
//   POST   /movie-composite             propagate a create
//   DELETE /movie-composite/{movieId}   propagate a delete
//   GET    /health                      composite backend health
//   GET    /metrics                     Prometheus exposition
//
// Error bodies use the same structured shape the backends use:
// {timestamp, path, status, message}. The optional X-Caller-Id header is
// logged on the read path and used for nothing else.
//
// ============================================================================

pub struct AppState {
    pub composite: Arc<MovieCompositeService>,
    pub health: HealthAggregator,
}

pub async fn run(state: AppState, port: u16) -> std::io::Result<()> {
    tracing::info!(port, "Starting composite HTTP server");

    let state = web::Data::new(state);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/movie-composite/{movie_id}",
        web::get().to(get_movie_composite),
    )
    .route("/movie-composite", web::post().to(create_movie_composite))
    .route(
        "/movie-composite/{movie_id}",
        web::delete().to(delete_movie_composite),
    )
    .route("/health", web::get().to(health))
    .route("/metrics", web::get().to(metrics));
}

async fn get_movie_composite(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    let movie_id = path.into_inner();

    if let Some(caller) = req
        .headers()
        .get("X-Caller-Id")
        .and_then(|v| v.to_str().ok())
    {
        tracing::info!(caller, movie_id, "Composite read requested");
    }

    match state.composite.get_composite_movie(movie_id).await {
        Ok(aggregate) => HttpResponse::Ok().json(aggregate),
        Err(e) => error_response(e, req.path()),
    }
}

async fn create_movie_composite(
    state: web::Data<AppState>,
    body: web::Json<MovieAggregate>,
    req: HttpRequest,
) -> HttpResponse {
    match state.composite.create_composite_movie(body.into_inner()).await {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => error_response(e, req.path()),
    }
}

async fn delete_movie_composite(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    match state.composite.delete_composite_movie(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => error_response(e, req.path()),
    }
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let composite_health = state.health.health().await;

    match composite_health.status {
        HealthStatus::Up => HttpResponse::Ok().json(composite_health),
        HealthStatus::Down => HttpResponse::ServiceUnavailable().json(composite_health),
    }
}

async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.composite.metrics().registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Metrics encoding failed");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

fn error_response(err: ServiceError, path: &str) -> HttpResponse {
    match err {
        ServiceError::NotFound(msg) => {
            HttpResponse::NotFound().json(HttpErrorInfo::new(404, path, msg))
        }
        ServiceError::InvalidInput(msg) => {
            HttpResponse::UnprocessableEntity().json(HttpErrorInfo::new(422, path, msg))
        }
        other => {
            tracing::error!(error = %other, path, "Unmapped error on the REST surface");
            HttpResponse::InternalServerError().json(HttpErrorInfo::new(
                500,
                path,
                other.to_string(),
            ))
        }
    }
}
