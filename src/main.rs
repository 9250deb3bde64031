use std::sync::Arc;

use tokio::sync::mpsc;

use trip_stream::init::{Config, StreamConfig};
use trip_stream::models::{SearchRequest, extract_flight_offers};
use trip_stream::server::{DemoConfig, serve};
use trip_stream::stream::orchestrator::{ProgressHooks, SearchClient};
use trip_stream::stream::progress::LogEntry;

/// Demo hooks: progress goes to the log, the terminal result comes back to
/// main over a channel.
struct LoggingHooks {
    done_tx: mpsc::Sender<Result<String, String>>,
}

impl ProgressHooks for LoggingHooks {
    fn on_progress(&self, step: &str, percent: u8, entry: &LogEntry) {
        log::info!("[{:>3}%] {} ({})", percent, step, entry.kind);
    }

    fn on_complete(&self, payload: String) {
        let _ = self.done_tx.try_send(Ok(payload));
    }

    fn on_error(&self, reason: String) {
        let _ = self.done_tx.try_send(Err(reason));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let (addr, _service) = serve(
        &format!("{}:{}", config.host, config.port),
        DemoConfig::default(),
    )
    .await?;
    log::info!("🚀 Demo search service started");
    log::info!("📍 http://{}", addr);
    log::info!("📡 Stream: http://{}/search/stream", addr);
    log::info!("❤️  Health: http://{}/health", addr);

    let mut stream_config = StreamConfig::from_env()?;
    stream_config.base_url = format!("http://{}", addr);

    let (done_tx, mut done_rx) = mpsc::channel(1);
    let client = SearchClient::new(stream_config, Arc::new(LoggingHooks { done_tx }))?;

    let request = SearchRequest {
        origin: "Paris".to_string(),
        destination: "Tokyo".to_string(),
        depart_date: Some("2026-04-17".parse()?),
        return_date: Some("2026-05-02".parse()?),
        budget: Some(1200),
        preferences: Some("direct flights if possible".to_string()),
    };
    log::info!("🔎 Searching {} -> {}", request.origin, request.destination);
    client.start(request).await?;

    match done_rx.recv().await {
        Some(Ok(payload)) => {
            log::info!("✅ Search complete");
            for offer in extract_flight_offers(&payload) {
                log::info!("✈️  {} at {} for {}€", offer.airline, offer.departure, offer.price);
            }
        }
        Some(Err(reason)) => log::error!("❌ Search failed: {}", reason),
        None => log::error!("❌ Search ended without a result"),
    }

    Ok(())
}
