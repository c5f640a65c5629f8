use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use ticketline_core::realtime::{ChannelError, RealtimeChannel, RealtimeConnector};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

/// WebSocket connector for the booking tracking server
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl RealtimeConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeChannel>, ChannelError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!("WebSocket connection established to {} ({})", url, response.status());
        Ok(Box::new(WsChannel { stream, closed: false }))
    }
}

#[async_trait]
impl RealtimeChannel for WsChannel {
    async fn recv(&mut self) -> Result<Option<String>, ChannelError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(ChannelError::Transport(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Close(frame))) => {
                    debug!("Tracking server closed the channel: {:?}", frame);
                    return Ok(None);
                }
                // Pongs are queued by tungstenite itself; binary frames carry nothing for us
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.close(None).await {
            debug!("WebSocket close handshake failed: {}", e);
        }
        info!("WebSocket connection closed.");
    }
}
