use crate::CoreResult;

/// Sends the customer to an external page; ends the tracker's lifecycle
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> CoreResult<()>;
}
