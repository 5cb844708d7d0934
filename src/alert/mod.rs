pub mod discord;
pub mod error;

pub use discord::DiscordClient;
pub use error::AlertError;

/// Destination for pre-formatted alert text.
pub trait AlertSink {
    async fn send_alert(&self, message: &str) -> Result<(), AlertError>;
}
