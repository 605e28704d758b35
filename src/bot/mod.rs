/// Command handlers (`/start`, `/help`)
pub mod handlers;
/// Link download pipeline
pub mod link;
/// Outbound messaging seam and its Telegram implementation
pub mod transport;
/// User-facing texts
pub mod views;

pub use transport::{ChatTransport, TelegramTransport};
