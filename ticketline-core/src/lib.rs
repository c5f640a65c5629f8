pub mod message;
pub mod nullable;
pub mod payment;
pub mod credentials;
pub mod navigation;
pub mod realtime;

pub use message::{BookingId, InboundMessage, OutboundFrame};
pub use nullable::{NullInt32, NullString};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Navigation failed: {0}")]
    NavigationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Join an origin (with or without trailing `/`) and an absolute path
pub fn join_url(origin: &str, path: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/'))
}
