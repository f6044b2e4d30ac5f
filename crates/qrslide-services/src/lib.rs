//! qrslide-services: the transfer sessions and everything that drives them.
//!
//! [`Sender`] and [`Receiver`] are the stop-and-wait state machines. They are
//! synchronous and never touch I/O: a capture loop feeds them one decoded
//! symbol at a time and displays whatever they answer. The remaining modules
//! are that collaborator side: file source/sink, a simulated optical channel,
//! and the async capture loop.

pub mod capture;
pub mod channel;
pub mod file_transfer;
pub mod receiver;
pub mod sender;
pub mod service;
pub mod status;

pub use capture::{run_capture_loop, run_loopback, CaptureReport, LoopbackError, LoopbackOutcome};
pub use channel::{optical_link, Camera, NoiseModel, Reading, Screen};
pub use file_transfer::{persist, read_source, SourceFile, TransferError};
pub use receiver::{ReceivedFile, Receiver, ReceiverPhase};
pub use sender::{Sender, SenderPhase};
pub use service::{Role, SymbolSession};
pub use status::{ReceiverStatus, SenderStatus};
