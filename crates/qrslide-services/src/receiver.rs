//! Receiving side of a transfer: in-order reassembly and confirmations.
//!
//! The receiver answers every accepted frame with a Confirm and otherwise
//! stays silent. Its state only moves forward:
//!
//! ```text
//!  AwaitingTitle ──Title──▶ ReceivingContent ──End──▶ Completed
//!                               │      ▲
//!                               └──D n─┘  (n == expected index)
//! ```
//!
//! A Content frame carrying the index accepted last is a retransmission from
//! a sender that missed our confirmation. It is answered with the same
//! confirmation again and never appended twice.

use qrslide_core::slide::{self, Slide};

use crate::service::{Role, SymbolSession};
use crate::status::ReceiverStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverPhase {
    AwaitingTitle,
    ReceivingContent,
    Completed,
}

/// A finished incoming file, handed to whoever stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub file_name: String,
    pub content: String,
}

/// Receive-side state for one incoming file.
#[derive(Debug)]
pub struct Receiver {
    phase: ReceiverPhase,
    file_name: String,
    content: String,
    /// Content frames accepted so far. The expected index is this mod 10.
    accepted: usize,
    handed_off: bool,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    pub fn new() -> Self {
        Self {
            phase: ReceiverPhase::AwaitingTitle,
            file_name: String::new(),
            content: String::new(),
            accepted: 0,
            handed_off: false,
        }
    }

    /// Process one decoded symbol from the camera.
    ///
    /// Returns a confirmation to display when the symbol was accepted (or is
    /// a retransmission of the frame accepted last).
    pub fn on_symbol(&mut self, symbol: &str) -> Option<String> {
        let slide = match Slide::decode(symbol) {
            Ok(slide) => slide,
            Err(e) => {
                tracing::trace!(error = %e, "receiver ignoring undecodable symbol");
                return None;
            }
        };

        match slide {
            Slide::Title { file_name } => match self.phase {
                ReceiverPhase::AwaitingTitle => self.start(file_name),
                ReceiverPhase::ReceivingContent | ReceiverPhase::Completed => {
                    tracing::trace!(file_name = %file_name, "ignoring stray title frame");
                    None
                }
            },
            Slide::Content { index, text } => match self.phase {
                ReceiverPhase::ReceivingContent => self.accept_content(index, text),
                ReceiverPhase::AwaitingTitle | ReceiverPhase::Completed => {
                    tracing::trace!(index, phase = ?self.phase, "ignoring content frame");
                    None
                }
            },
            Slide::End => match self.phase {
                ReceiverPhase::ReceivingContent => self.finish(),
                ReceiverPhase::AwaitingTitle | ReceiverPhase::Completed => None,
            },
            // Our own confirmations reflected back, or a second receiver in view.
            Slide::Confirm { .. } => None,
        }
    }

    fn start(&mut self, file_name: String) -> Option<String> {
        tracing::info!(file_name = %file_name, "incoming transfer");
        self.file_name = file_name;
        self.content.clear();
        self.accepted = 0;
        self.phase = ReceiverPhase::ReceivingContent;
        self.current_frame()
    }

    fn accept_content(&mut self, index: u8, text: String) -> Option<String> {
        let expected = self.expected_index();

        if index == expected {
            self.content.push_str(&text);
            self.accepted += 1;
            tracing::debug!(
                index,
                bytes = text.len(),
                total = self.content.len(),
                "content frame accepted"
            );
            return self.current_frame();
        }

        if self.last_accepted_index() == Some(index) {
            tracing::debug!(index, "duplicate content frame, repeating confirmation");
            return self.current_frame();
        }

        tracing::debug!(index, expected, "ignoring out-of-sequence content frame");
        None
    }

    fn finish(&mut self) -> Option<String> {
        self.phase = ReceiverPhase::Completed;
        tracing::info!(
            file_name = %self.file_name,
            bytes = self.content.len(),
            slides = self.accepted,
            "transfer completed"
        );
        None
    }

    /// Index the next Content frame must carry.
    pub fn expected_index(&self) -> u8 {
        slide::wrap_index(self.accepted)
    }

    fn last_accepted_index(&self) -> Option<u8> {
        self.accepted.checked_sub(1).map(slide::wrap_index)
    }

    /// The confirmation currently on display. Idempotent.
    ///
    /// After the Title this is `C0`; after each accepted chunk it echoes
    /// that chunk's index.
    pub fn current_frame(&self) -> Option<String> {
        if self.phase == ReceiverPhase::AwaitingTitle {
            return None;
        }
        let index = self.last_accepted_index().unwrap_or(0);
        Slide::Confirm { index }.encode().ok()
    }

    /// Hand out the finished file. Returns `Some` exactly once, after the
    /// End frame has been accepted.
    pub fn take_file(&mut self) -> Option<ReceivedFile> {
        if self.phase != ReceiverPhase::Completed || self.handed_off {
            return None;
        }
        self.handed_off = true;
        Some(ReceivedFile {
            file_name: self.file_name.clone(),
            content: self.content.clone(),
        })
    }

    pub fn status(&self) -> ReceiverStatus {
        match self.phase {
            ReceiverPhase::AwaitingTitle => ReceiverStatus::WaitingForFile,
            ReceiverPhase::ReceivingContent => ReceiverStatus::Receiving {
                file_name: self.file_name.clone(),
                received: self.accepted,
            },
            ReceiverPhase::Completed => ReceiverStatus::Completed {
                file_name: self.file_name.clone(),
            },
        }
    }

    pub fn phase(&self) -> ReceiverPhase {
        self.phase
    }

    /// File name from the Title frame; empty until one arrives.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_completed(&self) -> bool {
        self.phase == ReceiverPhase::Completed
    }
}

impl SymbolSession for Receiver {
    fn role(&self) -> Role {
        Role::Receiver
    }

    fn on_symbol(&mut self, symbol: &str) -> Option<String> {
        Receiver::on_symbol(self, symbol)
    }

    fn current_frame(&self) -> Option<String> {
        Receiver::current_frame(self)
    }

    fn is_completed(&self) -> bool {
        Receiver::is_completed(self)
    }
}
