//! Error taxonomy for the bridge engine (spec §4.6/§7).

use thiserror::Error;

/// Errors produced while talking to the chat platform or compositing
/// images for the `players` slash command.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The chat SDK call itself failed.
    #[error("chat platform error: {0}")]
    ChatPlatform(#[from] serenity::Error),

    /// An HTTP call (webhook post, avatar fetch) failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Avatar compositing failed.
    #[error("image compositing error: {0}")]
    Image(#[from] image::ImageError),

    /// The configured channel could not be found.
    #[error("configured channel {0} was not found")]
    ChannelNotFound(u64),
}
