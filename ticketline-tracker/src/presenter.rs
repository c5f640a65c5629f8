use serde_json::{json, Value};
use ticketline_core::BookingId;

use crate::state::{ErrorInfo, TrackerState};

pub const HEADER: &str = "Trạng Thái Đặt Vé";
pub const WAITING_TEXT: &str = "Đang xử lý... Vui lòng chờ trong giây lát.";
pub const REDIRECTING_TEXT: &str = "Đặt vé thành công! Đang chuyển hướng đến trang thanh toán...";
pub const RETRY_LABEL: &str = "Thực hiện lại";

/// Terminal view of a failed booking attempt, with the caller's reset hook
pub struct FailurePresenter<F: FnOnce()> {
    error: ErrorInfo,
    payload: Option<Value>,
    on_reset: F,
}

impl<F: FnOnce()> FailurePresenter<F> {
    pub fn new(error: ErrorInfo, payload: Option<Value>, on_reset: F) -> Self {
        Self { error, payload, on_reset }
    }

    pub fn error(&self) -> &ErrorInfo {
        &self.error
    }

    /// The server's payload when there is one, else `{"message": ...}`, pretty-printed
    pub fn body(&self) -> String {
        let shown = match &self.payload {
            Some(payload) => payload.clone(),
            None => json!({ "message": self.error.message }),
        };
        serde_json::to_string_pretty(&shown).unwrap_or_else(|_| self.error.message.clone())
    }

    pub fn render(&self) -> String {
        format!("{}\n{}\n[{}]", self.error.title, self.body(), RETRY_LABEL)
    }

    pub fn reset(self) {
        (self.on_reset)()
    }
}

/// Text for the non-terminal states, and the bare title/body for the final one
pub fn render_state(state: &TrackerState, booking_id: &BookingId) -> String {
    match state {
        TrackerState::WaitingResult => format!("{}\nBooking ID: {}", WAITING_TEXT, booking_id),
        TrackerState::Redirecting { .. } => REDIRECTING_TEXT.to_string(),
        TrackerState::Final { error, payload } => FailurePresenter::new(error.clone(), payload.clone(), || {}).render(),
    }
}
