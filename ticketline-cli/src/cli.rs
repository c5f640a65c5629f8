use clap::{Parser, Subcommand};
use ticketline_store::Config;

/// Booking outcome tracker for Ticketline
#[derive(Debug, Parser)]
#[command(name = "ticketline", version, about = "Track a bus booking and hand off to payment")]
pub struct Cli {
    /// Extra configuration file, applied after config/default
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Wait for a booking outcome and open the payment page
    Track {
        /// Booking id returned when the booking was submitted
        booking_id: String,
        /// Real-time server origin, e.g. ws://172.188.164.9
        #[arg(long)]
        realtime_origin: Option<String>,
        /// Backend API origin hosting the payment gateway endpoint
        #[arg(long)]
        api_origin: Option<String>,
        /// Seconds to wait for the outcome; 0 waits forever
        #[arg(long)]
        wait_timeout: Option<u64>,
        /// Hand the payment URL to the desktop browser
        #[arg(long)]
        open_browser: bool,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub realtime_origin: Option<String>,
    pub api_origin: Option<String>,
    pub wait_timeout: Option<u64>,
    pub open_browser: bool,
}

impl Overrides {
    /// Flags win over every configuration source
    pub fn apply(&self, config: &mut Config) {
        if let Some(origin) = &self.realtime_origin {
            config.realtime.origin = origin.clone();
        }
        if let Some(origin) = &self.api_origin {
            config.api.origin = origin.clone();
        }
        if let Some(secs) = self.wait_timeout {
            config.tracker.wait_timeout_seconds = secs;
        }
        if self.open_browser {
            config.navigation.open_browser = true;
        }
    }
}
