pub mod state;
pub mod connection;
pub mod handoff;
pub mod presenter;
pub mod tracker;

pub use connection::{ConnectionManager, ConnectionEvent};
pub use handoff::PaymentHandoff;
pub use presenter::FailurePresenter;
pub use state::{ErrorInfo, FailureKind, OutcomeMachine, TrackerState};
pub use tracker::{BookingTracker, TrackerOutcome};
