use clipfetch_bot::bot::handlers::{respond_to_command, Command};
use clipfetch_bot::bot::link::handle_link;
use clipfetch_bot::bot::TelegramTransport;
use clipfetch_bot::config::Settings;
use clipfetch_bot::download::{DownloadProvider, YtdlpProvider};
use clipfetch_bot::logging::{init_logging, RedactionPatterns};
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting clipfetch bot...");

    let settings = init_settings();
    init_download_dir(&settings).await;

    let provider: Arc<dyn DownloadProvider> = Arc::new(YtdlpProvider::from_settings(&settings));
    info!(
        ytdlp = %settings.ytdlp_path,
        download_dir = %settings.download_dir.display(),
        max_file_size_mb = settings.max_file_size_mb,
        "Download provider initialized."
    );

    let bot = init_bot(&settings)?;

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, provider])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_download_dir(settings: &Settings) {
    if let Err(e) = tokio::fs::create_dir_all(&settings.download_dir).await {
        error!(
            "Failed to create download directory {}: {}",
            settings.download_dir.display(),
            e
        );
        std::process::exit(1);
    }
}

fn init_bot(settings: &Settings) -> Result<Bot, Box<dyn std::error::Error>> {
    // Uploads of large videos outlive teloxide's default request timeout
    let client = teloxide::net::default_reqwest_settings()
        .timeout(settings.upload_timeout())
        .build()?;

    let mut bot = Bot::with_client(settings.bot_token.clone(), client);
    if let Some(ref api_url) = settings.telegram_api_url {
        bot = bot.set_api_url(reqwest::Url::parse(api_url)?);
        info!("Using custom Bot API server.");
    }
    Ok(bot)
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            // Plain text only; unknown commands are ignored
            dptree::filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
                .endpoint(handle_text),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    let transport = TelegramTransport::for_message(bot, &msg);
    if let Err(e) = respond_to_command(&transport, &settings, cmd).await {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    provider: Arc<dyn DownloadProvider>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return respond(());
    };

    debug!(chat_id = msg.chat.id.0, "Received text message");
    let transport = TelegramTransport::for_message(bot, &msg);

    match handle_link(&transport, provider, &settings, text).await {
        Ok(outcome) => debug!(chat_id = msg.chat.id.0, ?outcome, "Link request finished"),
        Err(e) => error!("Link handler error: {}", e),
    }
    respond(())
}
