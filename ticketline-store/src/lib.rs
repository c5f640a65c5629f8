pub mod app_config;
pub mod error;
pub mod payment_client;
pub mod realtime;
pub mod token_store;

pub use app_config::Config;
pub use error::{StoreError, StoreResult};
pub use payment_client::HttpPaymentGateway;
pub use realtime::WsConnector;
pub use token_store::{token_stores, FileTokenStore, SessionTokenStore};
