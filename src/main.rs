//! Entry point: load config, render the ticket page, and keep it in sync with the push channel.

use ticketwatch::config::Config;
use ticketwatch::services::renderer::{current_status, message_blocks};
use ticketwatch::{ChannelBinder, Document, TicketDetailPage, WsTransport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Without a ticket id this is a non-detail page and the binder stays idle.
    let document = match &config.ticket_id {
        Some(id) => TicketDetailPage::new(id.clone(), config.initial_status.clone()).render(),
        None => Document::new(),
    };

    let binder = ChannelBinder::new(WsTransport::new(), config.page_url.clone());
    let Some(handle) = binder.activate(document)? else {
        tracing::info!(page_url = %config.page_url, "not a ticket detail page; nothing to watch");
        return Ok(());
    };

    tracing::info!(url = %handle.url(), "watching ticket");
    let document = handle.join().await?;
    tracing::info!(
        status = current_status(&document).as_deref().unwrap_or(""),
        messages = message_blocks(&document).len(),
        "push channel done"
    );
    println!("{}", document.to_html());
    Ok(())
}
