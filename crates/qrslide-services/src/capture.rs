//! Capture loop: the external driver of a transfer session.
//!
//! Once per frame tick: capture one symbol, hand it to the session, show the
//! reply. The loop task owns its session outright, so calls into the
//! session are serialised and arrive in capture order.
//!
//! A render that already produced a reply is never fed again. Without this a
//! confirmation still on the peer's screen would acknowledge the frame sent
//! in response to it (`C0` answers both the Title and chunk 0).

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;

use qrslide_core::config::CaptureConfig;

use crate::channel::{optical_link, Camera, NoiseModel, Screen};
use crate::receiver::Receiver;
use crate::sender::Sender;
use crate::service::SymbolSession;

/// What a capture loop hands back when it stops.
#[derive(Debug)]
pub struct CaptureReport<S> {
    pub session: S,
    /// Frame ticks processed.
    pub frames: u64,
    pub completed: bool,
}

/// Drive `session` until it completes or `shutdown` flips to `true`.
///
/// The session's current frame (if any) is shown before the first tick.
pub async fn run_capture_loop<S: SymbolSession>(
    mut session: S,
    mut camera: Camera,
    mut screen: Screen,
    frame_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> CaptureReport<S> {
    let role = session.role();
    if let Some(frame) = session.current_frame() {
        screen.show(frame);
    }

    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut frames = 0u64;
    let mut spent_generation = None;

    while !session.is_completed() && !stop_requested(&shutdown) {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    tracing::debug!(?role, "shutdown handle dropped, stopping");
                    break;
                }
                continue;
            }
        }
        frames += 1;

        let Some(reading) = camera.capture() else {
            continue;
        };
        if spent_generation == Some(reading.generation) {
            continue;
        }

        if let Some(reply) = session.on_symbol(&reading.symbol) {
            tracing::trace!(?role, reply = reply.trim_end(), "showing reply");
            spent_generation = Some(reading.generation);
            screen.show(reply);
        }
    }

    let completed = session.is_completed();
    tracing::info!(?role, frames, completed, "capture loop stopped");
    CaptureReport {
        session,
        frames,
        completed,
    }
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Both ends of a finished loopback transfer.
#[derive(Debug)]
pub struct LoopbackOutcome {
    pub sender: Sender,
    pub receiver: Receiver,
    pub sender_frames: u64,
    pub receiver_frames: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopbackError {
    #[error("transfer did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("capture task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("receiver stopped before the transfer completed")]
    Incomplete,
}

/// Run a begun `sender` against `receiver` over two simulated optical links
/// (sender screen → receiver camera, receiver screen → sender camera).
///
/// Returns once the receiver has accepted the End frame. The sender is
/// stopped at that point: it keeps showing End, waiting for a confirmation
/// the receiver never sends.
pub async fn run_loopback(
    sender: Sender,
    receiver: Receiver,
    noise: NoiseModel,
    capture: &CaptureConfig,
) -> Result<LoopbackOutcome, LoopbackError> {
    let (sender_screen, receiver_camera) = optical_link(noise);
    let (receiver_screen, sender_camera) = optical_link(noise.with_seed(noise.seed ^ 1));
    let (stop_tx, stop_rx) = watch::channel(false);
    let interval = capture.frame_interval();

    let sender_task = tokio::spawn(run_capture_loop(
        sender,
        sender_camera,
        sender_screen,
        interval,
        stop_rx.clone(),
    ));
    let receiver_task = tokio::spawn(run_capture_loop(
        receiver,
        receiver_camera,
        receiver_screen,
        interval,
        stop_rx,
    ));

    let received = match capture.transfer_timeout() {
        Some(limit) => match tokio::time::timeout(limit, receiver_task).await {
            Ok(joined) => joined?,
            Err(_) => {
                stop_tx.send_replace(true);
                tracing::warn!(?limit, "loopback transfer timed out");
                return Err(LoopbackError::TimedOut(limit));
            }
        },
        None => receiver_task.await?,
    };

    stop_tx.send_replace(true);
    let sent = sender_task.await?;

    if !received.completed {
        return Err(LoopbackError::Incomplete);
    }

    Ok(LoopbackOutcome {
        sender: sent.session,
        receiver: received.session,
        sender_frames: sent.frames,
        receiver_frames: received.frames,
    })
}
