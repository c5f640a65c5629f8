use std::process::Command;
use ticketline_core::navigation::Navigator;
use ticketline_core::{CoreError, CoreResult};
use tracing::info;

/// Terminal stand-in for a full-page redirect: prints the payment URL and
/// optionally hands it to the desktop opener
#[derive(Debug, Clone)]
pub struct TerminalNavigator {
    open_browser: bool,
}

impl TerminalNavigator {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

pub fn opener_command(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url);
    cmd
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, url: &str) -> CoreResult<()> {
        println!("Payment page: {}", url);
        if !self.open_browser {
            return Ok(());
        }
        info!("Opening payment page in browser");
        opener_command(url)
            .spawn()
            .map(|_| ())
            .map_err(|e| CoreError::NavigationError(e.to_string()))
    }
}
