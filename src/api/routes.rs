use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api::handlers::{
    modes::{get_state, set_channel, start_mode, stop_all, stop_mode},
    stats::{
        get_deauth_events, get_deauth_statistics, get_networks, get_pipeline_counters,
        get_signal_history, get_signal_statistics, reset_deauth_statistics,
    },
};
use crate::api::websocket::ws_index;

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "AirSentry API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "modes": ["scanning", "sniffing", "spamming", "detecting"],
        "endpoints": [
            { "path": "/api/state", "method": "GET", "description": "Current mode, channel and session" },
            { "path": "/api/modes/{mode}/start", "method": "POST", "description": "Start a mode" },
            { "path": "/api/modes/{mode}/stop", "method": "POST", "description": "Stop a mode" },
            { "path": "/api/modes/stop", "method": "POST", "description": "Stop whatever is running" },
            { "path": "/api/channel", "method": "POST", "description": "Retune the radio" },
            { "path": "/api/stats/signal", "method": "GET", "description": "Signal counters" },
            { "path": "/api/stats/history", "method": "GET", "description": "Recent RSSI samples" },
            { "path": "/api/stats/deauth", "method": "GET", "description": "Deauth attack statistics" },
            { "path": "/api/stats/deauth/reset", "method": "POST", "description": "Reset deauth statistics" },
            { "path": "/api/stats/deauth/events", "method": "GET", "description": "Recent deauth frames" },
            { "path": "/api/stats/pipeline", "method": "GET", "description": "Event pipeline counters" },
            { "path": "/api/networks", "method": "GET", "description": "Last scan results" },
            { "path": "/api/ws", "method": "GET", "description": "WebSocket endpoint for real-time updates" }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                // WebSocket route for real-time updates
                .route("/ws", web::get().to(ws_index))
                .route("/state", web::get().to(get_state))
                .route("/channel", web::post().to(set_channel))
                .route("/networks", web::get().to(get_networks))
                .service(
                    web::scope("/modes")
                        .route("/stop", web::post().to(stop_all))
                        .route("/{mode}/start", web::post().to(start_mode))
                        .route("/{mode}/stop", web::post().to(stop_mode))
                )
                .service(
                    web::scope("/stats")
                        .route("/signal", web::get().to(get_signal_statistics))
                        .route("/history", web::get().to(get_signal_history))
                        .route("/deauth", web::get().to(get_deauth_statistics))
                        .route("/deauth/reset", web::post().to(reset_deauth_statistics))
                        .route("/deauth/events", web::get().to(get_deauth_events))
                        .route("/pipeline", web::get().to(get_pipeline_counters))
                )
        );
}
