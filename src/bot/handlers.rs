use crate::bot::transport::ChatTransport;
use crate::bot::views;
use crate::config::Settings;
use anyhow::Result;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

/// Commands understood by the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "الأوامر المتاحة:")]
pub enum Command {
    /// Greeting and supported sites
    #[command(description = "ابدأ واعرف المواقع المدعومة.")]
    Start,
    /// Usage notes
    #[command(description = "طريقة الاستخدام والملاحظات.")]
    Help,
}

/// Send the fixed reply for `cmd`.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn respond_to_command(
    transport: &dyn ChatTransport,
    settings: &Settings,
    cmd: Command,
) -> Result<()> {
    match cmd {
        Command::Start => start(transport).await,
        Command::Help => help(transport, settings).await,
    }
}

/// Handle `/start`.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn start(transport: &dyn ChatTransport) -> Result<()> {
    transport
        .reply_text(views::START_TEXT, Some(ParseMode::Html))
        .await?;
    Ok(())
}

/// Handle `/help`.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn help(transport: &dyn ChatTransport, settings: &Settings) -> Result<()> {
    transport
        .reply_text(
            &views::help_text(settings.max_file_size_mb),
            Some(ParseMode::Html),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "clipbot").ok(), Some(Command::Start));
        assert_eq!(Command::parse("/help", "clipbot").ok(), Some(Command::Help));
        assert_eq!(
            Command::parse("/help@clipbot", "clipbot").ok(),
            Some(Command::Help)
        );
        assert!(Command::parse("/clear", "clipbot").is_err());
    }

    #[test]
    fn test_command_descriptions_list_both() {
        let descriptions = Command::descriptions().to_string();
        assert!(descriptions.contains("/start"));
        assert!(descriptions.contains("/help"));
    }
}
