use std::sync::Arc;
use ticketline_core::realtime::{ChannelError, RealtimeChannel, RealtimeConnector};
use ticketline_core::{join_url, BookingId, InboundMessage, OutboundFrame};
use tracing::{debug, error, info, warn};

pub const TRACK_PATH: &str = "/api/v1/ws/track";

/// `{origin}/api/v1/ws/track/{booking_id}`
pub fn tracking_url(origin: &str, booking_id: &BookingId) -> String {
    join_url(origin, &format!("{}/{}", TRACK_PATH, booking_id))
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("reconnection is disabled (booking {0})")]
    ReconnectDisabled(BookingId),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Message(InboundMessage),
    /// Transport failure, or the channel was never opened
    Lost(String),
    /// Server closed the channel
    Closed,
}

/// Owns the single tracking channel of one booking attempt.
/// Connects at most once; there is no reconnection.
pub struct ConnectionManager {
    booking_id: BookingId,
    url: String,
    connector: Arc<dyn RealtimeConnector>,
    channel: Option<Box<dyn RealtimeChannel>>,
    attempted: bool,
    acks_sent: u64,
}

impl ConnectionManager {
    pub fn new(booking_id: BookingId, realtime_origin: &str, connector: Arc<dyn RealtimeConnector>) -> Self {
        let url = tracking_url(realtime_origin, &booking_id);
        Self { booking_id, url, connector, channel: None, attempted: false, acks_sent: 0 }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn acks_sent(&self) -> u64 {
        self.acks_sent
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    pub async fn open(&mut self) -> Result<(), ConnectionError> {
        if self.attempted {
            warn!("Refusing to reconnect tracking channel for booking {}", self.booking_id);
            return Err(ConnectionError::ReconnectDisabled(self.booking_id.clone()));
        }
        self.attempted = true;

        match self.connector.connect(&self.url).await {
            Ok(channel) => {
                info!("Tracking booking {} on {}", self.booking_id, self.url);
                self.channel = Some(channel);
                Ok(())
            }
            Err(e) => {
                error!("WebSocket error for booking {}: {}", self.booking_id, e);
                Err(e.into())
            }
        }
    }

    /// Wait for the next frame. Every text frame is acknowledged before it is returned.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        let Some(channel) = self.channel.as_mut() else {
            return ConnectionEvent::Lost("channel is not open".into());
        };

        match channel.recv().await {
            Ok(Some(text)) => {
                debug!("Frame for booking {}: {}", self.booking_id, text);
                match channel.send(OutboundFrame::ack().to_json()).await {
                    Ok(()) => self.acks_sent += 1,
                    Err(e) => warn!("Failed to ack frame for booking {}: {}", self.booking_id, e),
                }
                ConnectionEvent::Message(InboundMessage::parse(&text))
            }
            Ok(None) => {
                info!("Tracking channel for booking {} closed by server", self.booking_id);
                self.channel = None;
                ConnectionEvent::Closed
            }
            Err(e) => {
                error!("WebSocket error for booking {}: {}", self.booking_id, e);
                self.channel = None;
                ConnectionEvent::Lost(e.to_string())
            }
        }
    }

    pub async fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }
    }
}
