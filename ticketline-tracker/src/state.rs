use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use ticketline_core::payment::{PaymentDataError, PaymentGatewayRequest};
use ticketline_core::InboundMessage;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::handoff;

pub const CONNECTION_ERROR_TITLE: &str = "⚠️ Lỗi Kết Nối";
pub const CONNECTION_ERROR_MESSAGE: &str = "Không thể kết nối tới WebSocket server.";
pub const BOOKING_FAILED_TITLE: &str = "❌ Đặt vé thất bại";
pub const BOOKING_FAILED_MESSAGE: &str = "Server trả về lỗi không xác định.";
pub const DATA_ERROR_TITLE: &str = "❌ Lỗi Dữ Liệu";
pub const DATA_ERROR_MESSAGE: &str =
    "Phản hồi từ server không đủ thông tin để thanh toán (thiếu ticket_id hoặc price).";
pub const CUSTOMER_ERROR_MESSAGE: &str =
    "Phản hồi từ server không có mã khách hàng hoặc số điện thoại để thanh toán.";
pub const PAYMENT_ERROR_TITLE: &str = "❌ Lỗi Thanh Toán";
pub const TIMEOUT_TITLE: &str = "⏱️ Hết Thời Gian Chờ";
pub const TIMEOUT_MESSAGE: &str = "Không nhận được kết quả đặt vé từ server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Connection,
    BookingFailed,
    DataIntegrity,
    Payment,
    Timeout,
}

/// What the user sees when the tracker stops without a redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: FailureKind,
    pub title: String,
    pub message: String,
}

impl ErrorInfo {
    fn new(kind: FailureKind, title: &str, message: impl Into<String>) -> Self {
        Self { kind, title: title.to_string(), message: message.into() }
    }

    pub fn connection() -> Self {
        Self::new(FailureKind::Connection, CONNECTION_ERROR_TITLE, CONNECTION_ERROR_MESSAGE)
    }

    pub fn booking_failed(server_message: Option<&str>) -> Self {
        Self::new(
            FailureKind::BookingFailed,
            BOOKING_FAILED_TITLE,
            server_message.unwrap_or(BOOKING_FAILED_MESSAGE),
        )
    }

    pub fn data_integrity(reason: &PaymentDataError) -> Self {
        let message = match reason {
            PaymentDataError::MissingCustomer => CUSTOMER_ERROR_MESSAGE,
            PaymentDataError::MissingTicketId | PaymentDataError::MissingPrice => DATA_ERROR_MESSAGE,
        };
        Self::new(FailureKind::DataIntegrity, DATA_ERROR_TITLE, message)
    }

    pub fn payment(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Payment, PAYMENT_ERROR_TITLE, message)
    }

    pub fn timeout() -> Self {
        Self::new(FailureKind::Timeout, TIMEOUT_TITLE, TIMEOUT_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    WaitingResult,
    Redirecting { ticket_id: String, payload: Value },
    Final { error: ErrorInfo, payload: Option<Value> },
}

impl TrackerState {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerState::WaitingResult => "WAITING_RESULT",
            TrackerState::Redirecting { .. } => "REDIRECTING",
            TrackerState::Final { .. } => "FINAL_STATE",
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, TrackerState::WaitingResult)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TrackerState::Final { .. })
    }
}

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    Message(InboundMessage),
    ConnectionLost(String),
    TimedOut,
    PaymentFailed(ErrorInfo),
}

/// Side effect requested by a transition; executed by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InitiatePayment(PaymentGatewayRequest),
}

/// Pure transition function. `None` means the event does not apply in `state`
/// and must be dropped.
pub fn transition(state: &TrackerState, event: TrackerEvent) -> Option<(TrackerState, Option<Command>)> {
    match (state, event) {
        (TrackerState::WaitingResult, TrackerEvent::Message(msg)) => Some(on_message(msg)),
        (TrackerState::WaitingResult, TrackerEvent::ConnectionLost(_)) => Some((
            TrackerState::Final { error: ErrorInfo::connection(), payload: None },
            None,
        )),
        (TrackerState::WaitingResult, TrackerEvent::TimedOut) => Some((
            TrackerState::Final { error: ErrorInfo::timeout(), payload: None },
            None,
        )),
        (TrackerState::Redirecting { payload, .. }, TrackerEvent::PaymentFailed(error)) => Some((
            TrackerState::Final { error, payload: Some(payload.clone()) },
            None,
        )),
        _ => None,
    }
}

fn on_message(msg: InboundMessage) -> (TrackerState, Option<Command>) {
    if msg.is_result() {
        let server_message = msg.failure_message().map(str::to_string);
        let payload = msg.payload;
        return match handoff::prepare_request(&payload) {
            Ok(request) => (
                TrackerState::Redirecting { ticket_id: request.ticket_id.clone(), payload },
                Some(Command::InitiatePayment(request)),
            ),
            Err(reason) => {
                let mut error = ErrorInfo::data_integrity(&reason);
                // Server text first, generic data error otherwise
                if let Some(text) = server_message {
                    error.message = text;
                }
                (
                    TrackerState::Final { error, payload: Some(payload).filter(|p| !p.is_null()) },
                    None,
                )
            }
        };
    }

    let error = ErrorInfo::booking_failed(msg.failure_message());
    let payload = msg.payload().cloned();
    (TrackerState::Final { error, payload }, None)
}

#[derive(Debug, Clone)]
pub struct StateChange {
    pub state: TrackerState,
    pub at: DateTime<Utc>,
}

/// Holds the current state and publishes every change to watchers
pub struct OutcomeMachine {
    state: TrackerState,
    changes: watch::Sender<StateChange>,
}

impl OutcomeMachine {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(StateChange { state: TrackerState::WaitingResult, at: Utc::now() });
        Self { state: TrackerState::WaitingResult, changes }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Apply one event. Returns the command the new state asks for, if any.
    pub fn apply(&mut self, event: TrackerEvent) -> Option<Command> {
        let Some((next, command)) = transition(&self.state, event.clone()) else {
            debug!("Ignoring {:?} in state {}", event, self.state.name());
            return None;
        };

        match &next {
            TrackerState::Final { error, .. } => warn!(
                "Booking tracker {} -> {}: {:?} {}",
                self.state.name(),
                next.name(),
                error.kind,
                error.message
            ),
            _ => info!("Booking tracker {} -> {}", self.state.name(), next.name()),
        }

        self.state = next;
        self.changes.send_replace(StateChange { state: self.state.clone(), at: Utc::now() });
        command
    }

    pub fn into_state(self) -> TrackerState {
        self.state
    }
}

impl Default for OutcomeMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(payload: Value) -> TrackerEvent {
        TrackerEvent::Message(InboundMessage::new("result", payload))
    }

    fn good_result(ticket: &str) -> TrackerEvent {
        result(json!({
            "ticket_id": ticket,
            "price": 150000,
            "customer_id": {"Valid": true, "Int32": 7},
            "phone": {"String": "0911111111", "Valid": true}
        }))
    }

    #[test]
    fn test_result_moves_to_redirecting_with_one_command() {
        let mut machine = OutcomeMachine::new();
        let command = machine.apply(good_result("T1"));

        let Some(Command::InitiatePayment(request)) = command else {
            panic!("expected a payment command");
        };
        assert_eq!(request.ticket_id, "T1");
        assert_eq!(request.customer_id, "7");
        assert!(matches!(machine.state(), TrackerState::Redirecting { ticket_id, .. } if ticket_id == "T1"));
    }

    #[test]
    fn test_at_most_one_payment_command() {
        let mut machine = OutcomeMachine::new();
        let events = vec![
            good_result("T1"),
            good_result("T2"),
            TrackerEvent::Message(InboundMessage::new("error", json!({"message": "late"}))),
            good_result("T3"),
        ];

        let commands: Vec<Command> = events.into_iter().filter_map(|e| machine.apply(e)).collect();
        assert_eq!(commands.len(), 1);
        assert!(matches!(machine.state(), TrackerState::Redirecting { ticket_id, .. } if ticket_id == "T1"));
    }

    #[test]
    fn test_server_failure_message() {
        let mut machine = OutcomeMachine::new();
        machine.apply(TrackerEvent::Message(InboundMessage::new("error", json!({"message": "Hết ghế"}))));

        match machine.state() {
            TrackerState::Final { error, payload } => {
                assert_eq!(error.kind, FailureKind::BookingFailed);
                assert_eq!(error.title, BOOKING_FAILED_TITLE);
                assert_eq!(error.message, "Hết ghế");
                assert_eq!(payload.as_ref(), Some(&json!({"message": "Hết ghế"})));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_unknown_failure_uses_default_message() {
        let mut machine = OutcomeMachine::new();
        machine.apply(TrackerEvent::Message(InboundMessage::parse("garbage")));

        let TrackerState::Final { error, payload } = machine.state() else { panic!("not final") };
        assert_eq!(error.message, BOOKING_FAILED_MESSAGE);
        assert_eq!(payload, &None);
    }

    #[test]
    fn test_result_missing_data_fails_closed() {
        let mut machine = OutcomeMachine::new();
        let command = machine.apply(result(json!({"price": 100})));
        assert!(command.is_none());

        let TrackerState::Final { error, .. } = machine.state() else { panic!("not final") };
        assert_eq!(error.kind, FailureKind::DataIntegrity);
        assert_eq!(error.message, DATA_ERROR_MESSAGE);

        let mut machine = OutcomeMachine::new();
        assert!(machine.apply(result(json!({"ticket_id": "T1"}))).is_none());
        let TrackerState::Final { error, .. } = machine.state() else { panic!("not final") };
        assert_eq!(error.kind, FailureKind::DataIntegrity);
    }

    #[test]
    fn test_incomplete_result_keeps_server_message() {
        let mut machine = OutcomeMachine::new();
        let command = machine.apply(result(json!({"message": "Vé đã bị hủy", "price": 100})));
        assert!(command.is_none());

        let TrackerState::Final { error, payload } = machine.state() else { panic!("not final") };
        assert_eq!(error.kind, FailureKind::DataIntegrity);
        assert_eq!(error.title, DATA_ERROR_TITLE);
        assert_eq!(error.message, "Vé đã bị hủy");
        assert_eq!(payload.as_ref(), Some(&json!({"message": "Vé đã bị hủy", "price": 100})));
    }

    #[test]
    fn test_unresolvable_customer_fails_closed() {
        let mut machine = OutcomeMachine::new();
        let command = machine.apply(result(json!({
            "ticket_id": "T1",
            "price": 100,
            "customer_id": {"Valid": false, "Int32": 0}
        })));
        assert!(command.is_none());

        let TrackerState::Final { error, .. } = machine.state() else { panic!("not final") };
        assert_eq!(error.message, CUSTOMER_ERROR_MESSAGE);
    }

    #[test]
    fn test_final_is_sticky() {
        let mut machine = OutcomeMachine::new();
        machine.apply(TrackerEvent::ConnectionLost("refused".into()));
        let before = machine.state().clone();

        assert!(machine.apply(good_result("T1")).is_none());
        assert!(machine.apply(TrackerEvent::TimedOut).is_none());
        assert!(machine.apply(TrackerEvent::PaymentFailed(ErrorInfo::payment("x"))).is_none());
        assert_eq!(machine.state(), &before);
        assert_eq!(
            machine.state(),
            &TrackerState::Final { error: ErrorInfo::connection(), payload: None }
        );
    }

    #[test]
    fn test_payment_failure_only_from_redirecting() {
        let mut machine = OutcomeMachine::new();
        assert!(machine.apply(TrackerEvent::PaymentFailed(ErrorInfo::payment("x"))).is_none());
        assert!(machine.state().is_waiting());

        machine.apply(good_result("T1"));
        machine.apply(TrackerEvent::PaymentFailed(ErrorInfo::payment("Invalid request payload")));

        let TrackerState::Final { error, payload } = machine.state() else { panic!("not final") };
        assert_eq!(error.kind, FailureKind::Payment);
        assert_eq!(error.message, "Invalid request payload");
        assert_eq!(payload.as_ref().and_then(|p| p.get("ticket_id")), Some(&json!("T1")));
    }

    #[test]
    fn test_timeout_only_while_waiting() {
        let mut machine = OutcomeMachine::new();
        machine.apply(TrackerEvent::TimedOut);
        let TrackerState::Final { error, .. } = machine.state() else { panic!("not final") };
        assert_eq!(error.kind, FailureKind::Timeout);
    }

    #[test]
    fn test_watchers_see_changes() {
        let mut machine = OutcomeMachine::new();
        let mut rx = machine.subscribe();
        assert!(rx.borrow_and_update().state.is_waiting());

        machine.apply(good_result("T1"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state.name(), "REDIRECTING");
    }
}
