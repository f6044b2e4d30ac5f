//! Session trait for symbol-driven transfer sessions.
//!
//! Both ends of a transfer react to the same kind of event: one text symbol
//! decoded from the camera. This trait is the contract between the capture
//! loop (which owns the camera and screen) and the session logic (which
//! decides what to show next).

use serde::Serialize;

/// Which end of the transfer a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sender,
    Receiver,
}

/// A transfer session driven one decoded symbol at a time.
///
/// Implementations hold no locks and never block. The caller serialises
/// calls and delivers symbols in the order it observed them.
pub trait SymbolSession: Send {
    fn role(&self) -> Role;

    /// Feed one decoded symbol. Returns the next symbol to display, or
    /// `None` to keep showing whatever is on screen.
    ///
    /// Noise (undecodable, stale or out-of-place frames) is absorbed here
    /// and never changes session state.
    fn on_symbol(&mut self, symbol: &str) -> Option<String>;

    /// The symbol this session currently wants on screen. Calling this
    /// never advances the session.
    fn current_frame(&self) -> Option<String>;

    fn is_completed(&self) -> bool;
}
