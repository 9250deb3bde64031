use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use serde::Serialize;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::models::SearchRequest;
use crate::stream::events::StreamEvent;

// ============================================================================
// Demo Search Service
// ============================================================================

/// Pacing for the scripted search stream.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Delay after each non-terminal event.
    pub step_delay: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(600),
        }
    }
}

/// The progress script for one search: the pipeline steps a real agent run
/// would report, then the completion payload.
pub fn search_script(request: &SearchRequest) -> Vec<StreamEvent> {
    let mut events = vec![
        StreamEvent::Log {
            message: format!(
                "Planning a trip from {} to {}",
                request.origin, request.destination
            ),
        },
        StreamEvent::Tool {
            message: "search_flights".to_string(),
        },
        StreamEvent::Log {
            message: "Comparing airline offers".to_string(),
        },
    ];
    if let Some(preferences) = &request.preferences {
        events.push(StreamEvent::Log {
            message: format!("Applying preferences: {preferences}"),
        });
    }
    events.push(StreamEvent::Complete {
        html: results_fragment(request),
    });
    events
}

/// Offer lines stay in the shape `extract_flight_offers` understands.
fn results_fragment(request: &SearchRequest) -> String {
    let date = request
        .depart_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "2026-04-17".to_string());
    format!(
        "<section class=\"results\">\n\
         <h2>Flights from {} to {}</h2>\n\
         <ul>\n\
         <li>- Air Nova departing {date} 08:15 for 420.0€</li>\n\
         <li>- United departing {date} 02:00 for 1131.0€</li>\n\
         </ul>\n\
         </section>",
        request.origin, request.destination
    )
}

// ============================================================================
// SSE Stream Handler
// ============================================================================

/// Handler for the search progress stream.
///
/// GET /search/stream?origin=..&destination=..
///
/// Returns: Server-Sent Events stream of `StreamEvent` JSON, terminal
/// event last.
pub async fn search_stream_handler(
    State(config): State<DemoConfig>,
    Query(request): Query<SearchRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = search_script(&request);
    let step_delay = config.step_delay;

    let stream = async_stream::stream! {
        for event in events {
            let terminal = event.is_terminal();
            match serde_json::to_string(&event) {
                Ok(json) => {
                    yield Ok(Event::default().event("message").data(json));
                }
                Err(e) => {
                    log::error!("failed to serialize stream event: {e}");
                    break;
                }
            }
            if terminal {
                break;
            }
            tokio::time::sleep(step_delay).await;
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Router Setup
// ============================================================================

pub fn router(config: DemoConfig) -> Router {
    Router::new()
        .route("/search/stream", get(search_stream_handler))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(config)
}

/// Bind and serve in the background; returns the bound address, so binding
/// port 0 gives tests an ephemeral service.
pub async fn serve(
    addr: &str,
    config: DemoConfig,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = router(config);
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("demo search service stopped: {e}");
        }
    });
    Ok((local_addr, task))
}

// ============================================================================
// Tests
// ============================================================================
