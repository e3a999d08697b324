use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::api::SharedCoordinator;

/// Query parameters for the signal history
#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_max")]
    max: usize,
}

fn default_max() -> usize { 80 }

pub async fn get_signal_statistics(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let coordinator = coordinator.read().await;
    HttpResponse::Ok().json(coordinator.get_signal_statistics())
}

/// Most recent RSSI samples, oldest first
pub async fn get_signal_history(
    coordinator: web::Data<SharedCoordinator>,
    query: web::Query<HistoryQuery>,
) -> impl Responder {
    let coordinator = coordinator.read().await;
    let samples = coordinator.get_signal_history(query.max);
    HttpResponse::Ok().json(serde_json::json!({
        "count": samples.len(),
        "samples": samples,
    }))
}

pub async fn get_deauth_statistics(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let coordinator = coordinator.read().await;
    HttpResponse::Ok().json(coordinator.get_deauth_statistics())
}

pub async fn reset_deauth_statistics(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    coordinator.read().await.reset_deauth_statistics();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Deauth statistics reset"
    }))
}

pub async fn get_deauth_events(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let coordinator = coordinator.read().await;
    HttpResponse::Ok().json(coordinator.get_recent_deauth_events())
}

/// Processed, dropped and skipped counters of the event pipeline
pub async fn get_pipeline_counters(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let coordinator = coordinator.read().await;
    HttpResponse::Ok().json(coordinator.get_pipeline_counters())
}

/// Networks from the last completed scan
pub async fn get_networks(coordinator: web::Data<SharedCoordinator>) -> impl Responder {
    let coordinator = coordinator.read().await;
    HttpResponse::Ok().json(coordinator.get_networks())
}
