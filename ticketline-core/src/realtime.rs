use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// One open, bidirectional text channel
#[async_trait]
pub trait RealtimeChannel: Send {
    /// Next text frame, or `Ok(None)` once the peer has closed
    async fn recv(&mut self) -> Result<Option<String>, ChannelError>;

    async fn send(&mut self, text: String) -> Result<(), ChannelError>;

    async fn close(&mut self);
}

#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeChannel>, ChannelError>;
}
