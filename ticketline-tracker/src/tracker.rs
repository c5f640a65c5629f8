use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use ticketline_core::realtime::RealtimeConnector;
use ticketline_core::BookingId;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::connection::{ConnectionEvent, ConnectionManager};
use crate::handoff::PaymentHandoff;
use crate::state::{Command, ErrorInfo, OutcomeMachine, StateChange, TrackerEvent, TrackerState};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerOutcome {
    /// The customer was sent to the payment page
    Redirected { payment_url: String },
    Failed { error: ErrorInfo, payload: Option<Value> },
}

/// Follows one booking attempt from the tracking channel to the payment page
pub struct BookingTracker {
    booking_id: BookingId,
    connection: ConnectionManager,
    machine: OutcomeMachine,
    handoff: PaymentHandoff,
    wait_timeout: Option<Duration>,
}

impl BookingTracker {
    pub fn new(
        booking_id: BookingId,
        realtime_origin: &str,
        connector: Arc<dyn RealtimeConnector>,
        handoff: PaymentHandoff,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(booking_id.clone(), realtime_origin, connector),
            booking_id,
            machine: OutcomeMachine::new(),
            handoff,
            wait_timeout: None,
        }
    }

    /// Give up waiting for the booking outcome after `timeout`
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn booking_id(&self) -> &BookingId {
        &self.booking_id
    }

    pub fn state(&self) -> &TrackerState {
        self.machine.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<StateChange> {
        self.machine.subscribe()
    }

    /// Drive the tracker to its end. All failures end up in the returned outcome.
    pub async fn run(mut self) -> TrackerOutcome {
        info!("Tracking booking {}", self.booking_id);

        // The handshake counts against the wait deadline
        let deadline = self.wait_timeout.map(|t| Instant::now() + t);
        if let Some(event) = self.open(deadline).await {
            self.machine.apply(event);
        }

        while self.machine.state().is_waiting() {
            let event = self.next_event(deadline).await;
            let Some(Command::InitiatePayment(request)) = self.machine.apply(event) else {
                continue;
            };

            let result = self.handoff.execute(&request).await;
            self.connection.close().await;
            match result {
                Ok(payment_url) => {
                    info!("Booking {} handed off to payment", self.booking_id);
                    return TrackerOutcome::Redirected { payment_url };
                }
                Err(error) => {
                    self.machine.apply(TrackerEvent::PaymentFailed(error));
                }
            }
        }

        self.connection.close().await;
        match self.machine.into_state() {
            TrackerState::Final { error, payload } => TrackerOutcome::Failed { error, payload },
            // Every payment command ends in a redirect or a payment failure
            other => TrackerOutcome::Failed {
                error: ErrorInfo::payment(format!("tracker stopped in state {}", other.name())),
                payload: None,
            },
        }
    }

    async fn open(&mut self, deadline: Option<Instant>) -> Option<TrackerEvent> {
        let opened = match deadline {
            Some(at) => match tokio::time::timeout_at(at, self.connection.open()).await {
                Ok(opened) => opened,
                Err(_) => {
                    warn!("Tracking channel for booking {} not open before the wait deadline", self.booking_id);
                    return Some(TrackerEvent::TimedOut);
                }
            },
            None => self.connection.open().await,
        };
        opened.err().map(|e| TrackerEvent::ConnectionLost(e.to_string()))
    }

    async fn next_event(&mut self, deadline: Option<Instant>) -> TrackerEvent {
        let event = match deadline {
            Some(at) => match tokio::time::timeout_at(at, self.connection.next_event()).await {
                Ok(event) => event,
                Err(_) => return TrackerEvent::TimedOut,
            },
            None => self.connection.next_event().await,
        };

        match event {
            ConnectionEvent::Message(msg) => TrackerEvent::Message(msg),
            ConnectionEvent::Lost(reason) => TrackerEvent::ConnectionLost(reason),
            ConnectionEvent::Closed => TrackerEvent::ConnectionLost("closed before a result arrived".into()),
        }
    }
}
