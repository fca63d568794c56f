//! Server-side relay between the browser capture page and the Telegram Bot
//! API.
//!
//! The bot token and destination chat id live only in this process's
//! environment. The browser posts a report (caption plus an optional
//! data-URI photo) to `/api/telegram-proxy`; the relay validates it,
//! forwards it to `sendMessage` or `sendPhoto`, and maps every failure to
//! a stable `{success, error}` envelope.

pub mod config;
pub mod error;
pub mod media;
pub mod relay;
pub mod server;
pub mod telegram;
