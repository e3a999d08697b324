use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde::Deserialize;

use crate::api::handlers::error_response;
use crate::api::SharedCoordinator;
use crate::models::state::RadioMode;

/// Request for retuning the radio
#[derive(Deserialize)]
pub struct ChannelRequest {
    pub channel: u8,
}

/// Current state, channel and session
pub async fn get_state(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let coordinator = coordinator.read().await;
    HttpResponse::Ok().json(coordinator.status())
}

/// Start a mode, switching away from whatever is running
pub async fn start_mode(
    coordinator: web::Data<SharedCoordinator>,
    path: web::Path<String>,
) -> impl Responder {
    let mode = match path.parse::<RadioMode>() {
        Ok(mode) => mode,
        Err(e) => return error_response("Failed to start mode", &e),
    };

    let mut coordinator = coordinator.write().await;
    match coordinator.start_mode(mode).await {
        Ok(state) => {
            info!("Mode {} started via API", mode);
            HttpResponse::Ok().json(serde_json::json!({
                "status": "success",
                "state": state,
                "session": coordinator.session_info(),
            }))
        }
        Err(e) => {
            error!("Failed to start {}: {}", mode, e);
            error_response(&format!("Failed to start {}", mode), &e)
        }
    }
}

/// Stop a mode; stopping a mode that is not running changes nothing
pub async fn stop_mode(
    coordinator: web::Data<SharedCoordinator>,
    path: web::Path<String>,
) -> impl Responder {
    let mode = match path.parse::<RadioMode>() {
        Ok(mode) => mode,
        Err(e) => return error_response("Failed to stop mode", &e),
    };

    let state = coordinator.write().await.stop_mode(mode).await;
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "state": state,
    }))
}

/// Stop everything, including recovery from the error state
pub async fn stop_all(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let state = coordinator.write().await.stop_all().await;
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "state": state,
    }))
}

pub async fn set_channel(
    coordinator: web::Data<SharedCoordinator>,
    request: web::Json<ChannelRequest>,
) -> impl Responder {
    let mut coordinator = coordinator.write().await;
    match coordinator.set_channel(request.channel) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "channel": request.channel,
        })),
        Err(e) => error_response("Failed to set channel", &e),
    }
}
