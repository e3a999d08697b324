use actix_web::{web, Error, HttpRequest, Responder};
use actix_ws::{self, Message};
use futures_util::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::api::SharedCoordinator;
use crate::capture::manager::StatusReport;
use crate::models::stats::{DeauthStatistics, PipelineSnapshot, SignalStatistics};

// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

// How often statistics are pushed
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(1);

/// WebSocket message types that can be sent to clients
#[derive(Serialize)]
#[serde(tag = "type")]
enum WsOutMessage {
    #[serde(rename = "snapshot")]
    Snapshot {
        status: StatusReport,
        signal: SignalStatistics,
        deauth: DeauthStatistics,
        pipeline: PipelineSnapshot,
    },

    #[serde(rename = "status")]
    Status { status: StatusReport },

    #[serde(rename = "ping")]
    Ping { timestamp: i64 },
}

/// Handle WebSocket connections
pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    coordinator: web::Data<SharedCoordinator>,
) -> Result<impl Responder, Error> {
    let addr = req
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    info!("WebSocket connection from: {}", addr);

    let (response, session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let coordinator = coordinator.into_inner();

    actix_web::rt::spawn(async move {
        let connected = Instant::now();
        // milliseconds since `connected` at which the client last answered
        let last_seen = Arc::new(AtomicU64::new(0));

        let mut initial = session.clone();
        if let Err(e) = send_snapshot(&mut initial, &coordinator).await {
            warn!("Failed to send initial snapshot: {}", e);
            return;
        }

        let ws_msg_task = {
            let mut session = session.clone();
            let coordinator = coordinator.clone();
            let last_seen = last_seen.clone();

            async move {
                while let Some(Ok(msg)) = msg_stream.next().await {
                    last_seen.store(connected.elapsed().as_millis() as u64, Ordering::Relaxed);
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Text(text) => {
                            debug!("Received text message: {}", text);
                            let sent = match text.trim() {
                                "status" => send_status(&mut session, &coordinator).await,
                                "stats" => send_snapshot(&mut session, &coordinator).await,
                                _ => Ok(()),
                            };
                            if let Err(e) = sent {
                                warn!("Failed to answer client: {}", e);
                                break;
                            }
                        }
                        Message::Close(_) => {
                            info!("Client requested close");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        };

        let snapshot_task = {
            let mut session = session.clone();
            let coordinator = coordinator.clone();

            async move {
                let mut ticker = interval(SNAPSHOT_INTERVAL);
                loop {
                    ticker.tick().await;
                    if send_snapshot(&mut session, &coordinator).await.is_err() {
                        break;
                    }
                }
            }
        };

        let heartbeat_task = {
            let mut session = session.clone();

            async move {
                let mut heartbeat = interval(HEARTBEAT_INTERVAL);
                loop {
                    heartbeat.tick().await;

                    let idle_ms = (connected.elapsed().as_millis() as u64)
                        .saturating_sub(last_seen.load(Ordering::Relaxed));
                    if idle_ms > HEARTBEAT_INTERVAL.as_millis() as u64 * 3 {
                        warn!("WebSocket client heartbeat timed out");
                        let _ = session.close(None).await;
                        break;
                    }

                    let ping = WsOutMessage::Ping {
                        timestamp: chrono::Utc::now().timestamp(),
                    };
                    if let Ok(json) = serde_json::to_string(&ping) {
                        if session.text(json).await.is_err() {
                            break;
                        }
                    }
                }
            }
        };

        tokio::select! {
            _ = ws_msg_task => {},
            _ = snapshot_task => {},
            _ = heartbeat_task => {},
        }

        info!("WebSocket connection from {} closed", addr);
    });

    Ok(response)
}

/// Send the coordinator status to a WebSocket client
async fn send_status(
    session: &mut actix_ws::Session,
    coordinator: &SharedCoordinator,
) -> Result<(), actix_ws::Closed> {
    let status = coordinator.read().await.status();
    send(session, &WsOutMessage::Status { status }).await
}

/// Send current statistics to a WebSocket client
async fn send_snapshot(
    session: &mut actix_ws::Session,
    coordinator: &SharedCoordinator,
) -> Result<(), actix_ws::Closed> {
    let msg = {
        let coordinator = coordinator.read().await;
        WsOutMessage::Snapshot {
            status: coordinator.status(),
            signal: coordinator.get_signal_statistics(),
            deauth: coordinator.get_deauth_statistics(),
            pipeline: coordinator.get_pipeline_counters(),
        }
    };
    send(session, &msg).await
}

async fn send(session: &mut actix_ws::Session, msg: &WsOutMessage) -> Result<(), actix_ws::Closed> {
    if let Ok(json) = serde_json::to_string(msg) {
        session.text(json).await?;
    }
    Ok(())
}
