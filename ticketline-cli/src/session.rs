use anyhow::Context;
use std::sync::Arc;
use ticketline_core::BookingId;
use ticketline_store::{token_stores, Config, HttpPaymentGateway, WsConnector};
use ticketline_tracker::presenter::{render_state, HEADER, RETRY_LABEL};
use ticketline_tracker::state::StateChange;
use ticketline_tracker::{BookingTracker, FailurePresenter, PaymentHandoff, TrackerOutcome};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::navigator::TerminalNavigator;

pub fn build_tracker(config: &Config, booking_id: BookingId) -> anyhow::Result<BookingTracker> {
    let gateway = HttpPaymentGateway::new(&config.api.origin, config.api.request_timeout())
        .context("Failed to build payment gateway client")?;
    let handoff = PaymentHandoff::new(
        Arc::new(gateway),
        Arc::new(token_stores(&config.credentials)),
        Arc::new(TerminalNavigator::new(config.navigation.open_browser)),
    );

    Ok(BookingTracker::new(booking_id, &config.realtime.origin, Arc::new(WsConnector), handoff)
        .with_wait_timeout(config.tracker.wait_timeout()))
}

fn print_progress(mut changes: watch::Receiver<StateChange>, booking_id: BookingId) -> JoinHandle<()> {
    tokio::spawn(async move {
        println!("{}", render_state(&changes.borrow_and_update().state, &booking_id));
        while changes.changed().await.is_ok() {
            let state = changes.borrow_and_update().state.clone();
            // The failure view is printed by the presenter
            if !state.is_final() {
                println!("{}", render_state(&state, &booking_id));
            }
        }
    })
}

type InputLines = Lines<BufReader<Stdin>>;

async fn prompt_booking_id(input: &mut InputLines) -> anyhow::Result<Option<BookingId>> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{}? Booking ID (blank to quit): ", RETRY_LABEL).as_bytes())
        .await?;
    stdout.flush().await?;

    let line = input.next_line().await?;
    Ok(parse_booking_id(line))
}

fn parse_booking_id(line: Option<String>) -> Option<BookingId> {
    line.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).map(BookingId::from)
}

/// Track bookings until one reaches the payment page or the user stops retrying
pub async fn track(config: &Config, booking_id: BookingId) -> anyhow::Result<TrackerOutcome> {
    let mut booking_id = booking_id;
    // One reader for the whole session so buffered input survives between prompts
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HEADER);

    loop {
        let tracker = build_tracker(config, booking_id.clone())?;
        let progress = print_progress(tracker.subscribe(), booking_id.clone());
        let outcome = tracker.run().await;
        // Ends once the tracker drops its state sender
        if let Err(e) = progress.await {
            warn!("Progress printer stopped abnormally: {}", e);
        }

        let (error, payload) = match &outcome {
            TrackerOutcome::Failed { error, payload } => (error.clone(), payload.clone()),
            TrackerOutcome::Redirected { .. } => return Ok(outcome),
        };

        let presenter = FailurePresenter::new(error, payload, || {
            info!("Booking tracker reset by user");
        });
        println!("{}", presenter.render());

        match prompt_booking_id(&mut input).await? {
            Some(next) => {
                presenter.reset();
                booking_id = next;
            }
            None => return Ok(outcome),
        }
    }
}
