#![deny(missing_docs)]
//! clipfetch-bot
//!
//! A Telegram bot that takes a link, downloads the media behind it with yt-dlp
//! and sends the file back as a streamable video.

/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// Media download providers
pub mod download;
/// Tracing setup
pub mod logging;
