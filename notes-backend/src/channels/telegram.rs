//! Telegram transport: turns updates into dispatcher calls and views into
//! messages with inline keyboards.
//!
//! Button presses edit the message that carried the button; text messages and
//! commands get a fresh reply. Any failure is logged and answered with a
//! generic error message, so a broken update never takes the bot down.

use std::sync::Arc;

use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};

use super::dispatcher::NotesDispatcher;
use super::types::{Sender, Trigger, View};
use super::views;
use crate::errors::{BotError, BotResult};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "stop an unfinished note")]
    Cancel,
}

/// Build the update dispatcher. Call `dispatch()` on the result to start polling.
pub fn build_dispatcher(bot: Bot, notes: Arc<NotesDispatcher>) -> Dispatcher<Bot, BotError, DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![notes])
        .default_handler(|update| async move {
            log::trace!("[TELEGRAM] Ignoring update {:?}", update.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "[TELEGRAM] Error in update handler",
        ))
        .build()
}

/// Register the slash commands with Telegram so clients can suggest them.
pub async fn register_commands(bot: &Bot) {
    match bot.set_my_commands(Command::bot_commands()).await {
        Ok(_) => log::info!("[TELEGRAM] Registered bot commands"),
        Err(e) => log::warn!("[TELEGRAM] Failed to register bot commands: {}", e),
    }
}

fn schema() -> UpdateHandler<BotError> {
    let message_handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(on_command))
        .branch(dptree::endpoint(on_message));

    let callback_handler = Update::filter_callback_query().endpoint(on_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

fn message_sender(msg: &Message) -> Option<Sender> {
    msg.from().map(|user| Sender::new(user.id.0 as i64, msg.chat.id.0))
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    notes: Arc<NotesDispatcher>,
) -> Result<(), BotError> {
    let Some(sender) = message_sender(&msg) else {
        return Ok(());
    };
    log::debug!("[TELEGRAM] Command {:?} from {}", cmd, sender.owner_id);

    let view = match cmd {
        Command::Start => notes.start(),
        Command::Help => views::help(),
        Command::Cancel => notes.cancel(&sender),
    };
    reply(&bot, msg.chat.id, Ok(view)).await;
    Ok(())
}

async fn on_message(bot: Bot, msg: Message, notes: Arc<NotesDispatcher>) -> Result<(), BotError> {
    // Only text feeds the dialog; stickers, photos and the like are ignored.
    let Some(text) = msg.text() else {
        log::debug!("[TELEGRAM] Ignoring non-text message in chat {}", msg.chat.id.0);
        return Ok(());
    };
    let Some(sender) = message_sender(&msg) else {
        return Ok(());
    };

    // Unknown commands are never note text.
    if text.trim_start().starts_with('/') {
        log::debug!("[TELEGRAM] Unknown command {:?} from {}", text, sender.owner_id);
        reply(&bot, msg.chat.id, Ok(views::help())).await;
        return Ok(());
    }

    log::debug!(
        "[TELEGRAM] Text from {} while {}",
        sender.owner_id,
        notes.dialog_state(sender.owner_id).as_ref()
    );
    let result = notes.handle_text(&sender, text);
    reply(&bot, msg.chat.id, result).await;
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, notes: Arc<NotesDispatcher>) -> Result<(), BotError> {
    // Always answer so the client stops showing the loading spinner.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        log::warn!("[TELEGRAM] Failed to answer callback query {}: {}", q.id, e);
    }

    let Some(message) = q.message.as_ref() else {
        log::debug!("[TELEGRAM] Callback {} has no message attached", q.id);
        return Ok(());
    };
    let sender = Sender::new(q.from.id.0 as i64, message.chat.id.0);

    let trigger = match q.data.as_deref().and_then(Trigger::parse) {
        Some(trigger) => trigger,
        None => {
            log::warn!(
                "[TELEGRAM] Unrecognized callback data {:?} from {}",
                q.data,
                sender.owner_id
            );
            Trigger::Home
        }
    };

    let result = match notes.handle_trigger(&sender, trigger) {
        Ok(None) => return Ok(()),
        Ok(Some(view)) => Ok(view),
        Err(e) => Err(e),
    };
    let view = outcome_view(message.chat.id, result);
    if let Err(e) = edit_view(&bot, message, &view).await {
        report_failure(&bot, message.chat.id, e).await;
    }
    Ok(())
}

/// View to show for a handler result. Failures are logged and replaced by
/// the generic error.
fn outcome_view(chat_id: ChatId, result: BotResult<View>) -> View {
    result.unwrap_or_else(|e| {
        log::error!("[TELEGRAM] Failed to handle update in chat {}: {}", chat_id.0, e);
        views::generic_error()
    })
}

/// Send a handler result as a new message.
async fn reply(bot: &Bot, chat_id: ChatId, result: BotResult<View>) {
    let view = outcome_view(chat_id, result);
    if let Err(e) = send_view(bot, chat_id, &view).await {
        report_failure(bot, chat_id, e).await;
    }
}

async fn send_view(bot: &Bot, chat_id: ChatId, view: &View) -> BotResult<()> {
    bot.send_message(chat_id, view.text.clone())
        .reply_markup(keyboard(view))
        .await?;
    Ok(())
}

async fn edit_view(bot: &Bot, message: &Message, view: &View) -> BotResult<()> {
    let result = bot
        .edit_message_text(message.chat.id, message.id, view.text.clone())
        .reply_markup(keyboard(view))
        .await;

    match result {
        Ok(_) => Ok(()),
        // Pressing a button that re-renders the same screen.
        Err(RequestError::Api(ApiError::MessageNotModified)) => {
            log::debug!("[TELEGRAM] Message {} already up to date", message.id.0);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log a handler failure and tell the user to retry. Errors while sending
/// the notice are logged and dropped.
async fn report_failure(bot: &Bot, chat_id: ChatId, err: BotError) {
    let notice = outcome_view(chat_id, Err(err));
    if let Err(e) = send_view(bot, chat_id, &notice).await {
        log::warn!("[TELEGRAM] Failed to deliver error notice to chat {}: {}", chat_id.0, e);
    }
}

fn keyboard(view: &View) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(view.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.trigger.to_string()))
            .collect::<Vec<_>>()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::dispatcher::tests::CountingStore;
    use crate::channels::dialog::DialogState;
    use teloxide::types::InlineKeyboardButtonKind;

    /// Bot whose API calls all fail with a connection error.
    fn unreachable_bot() -> Bot {
        Bot::new("12345:test-token").set_api_url("http://127.0.0.1:1/".parse().unwrap())
    }

    #[test]
    fn test_keyboard_encodes_triggers() {
        let markup = keyboard(&views::note_saved(42));
        let first_row = &markup.inline_keyboard[0];

        assert_eq!(first_row.len(), 2);
        assert_eq!(first_row[0].text, "✏️ Edit");
        match &first_row[0].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "edit|42|0"),
            other => panic!("unexpected button kind: {:?}", other),
        }
        match &first_row[1].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "del|42|0"),
            other => panic!("unexpected button kind: {:?}", other),
        }
    }

    #[test]
    fn test_keyboard_keeps_row_layout() {
        let view = views::home();
        let markup = keyboard(&view);
        assert_eq!(markup.inline_keyboard.len(), view.rows.len());
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 1));
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "notes_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/cancel", "notes_bot").unwrap(), Command::Cancel);
        assert!(Command::parse("/unknown", "notes_bot").is_err());
    }

    #[test]
    fn test_handler_failure_becomes_generic_error() {
        let notes = NotesDispatcher::new(Arc::new(CountingStore::default()), 5);
        let alice = Sender::new(1, 1);

        notes.handle_trigger(&alice, Trigger::New).unwrap();
        let failed = notes.handle_text(&alice, "text");
        assert!(failed.is_err());
        assert_eq!(outcome_view(ChatId(1), failed), views::generic_error());
        assert_eq!(notes.dialog_state(1), DialogState::Idle);

        let failed = notes.handle_trigger(&alice, Trigger::List { page: 0 }).map(Option::unwrap);
        assert_eq!(outcome_view(ChatId(1), failed), views::generic_error());
    }

    #[test]
    fn test_successful_result_is_shown_as_is() {
        assert_eq!(outcome_view(ChatId(1), Ok(views::help())), views::help());
    }

    #[tokio::test]
    async fn test_delivery_failures_are_swallowed() {
        let bot = unreachable_bot();
        let chat = ChatId(1);
        assert!(send_view(&bot, chat, &views::home()).await.is_err());

        report_failure(&bot, chat, BotError::EmptyNote).await;
        reply(&bot, chat, Err(BotError::Config("boom".to_string()))).await;
        reply(&bot, chat, Ok(views::home())).await;
    }
}
