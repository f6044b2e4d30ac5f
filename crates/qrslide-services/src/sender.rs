//! Sending side of a transfer: stop-and-wait over slides.
//!
//! Exactly one frame is outstanding at a time. The sender keeps the same
//! frame on screen until a Confirm carrying that frame's index is read back;
//! retries are implicit in the redisplay, there is no timer here.
//!
//! Outstanding index per phase:
//!
//! ```text
//!  AwaitingTitleAck           0
//!  SendingContent { chunk }   chunk % 10
//!  AwaitingEndAck             chunk_count % 10
//! ```
//!
//! Only the unit digit travels, so a stale confirmation that happens to
//! share the outstanding digit is accepted. That window is part of the wire
//! format and is kept as is.

use std::path::Path;

use qrslide_core::slide::{self, Slide, MAX_FILE_NAME_LEN};

use crate::file_transfer::{read_source, TransferError};
use crate::service::{Role, SymbolSession};
use crate::status::SenderStatus;

/// Where the sender is in the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderPhase {
    /// No transfer loaded.
    Idle,
    /// Title on screen, waiting for `C0`.
    AwaitingTitleAck,
    /// Content chunk `chunk` on screen.
    SendingContent { chunk: usize },
    /// End frame on screen.
    AwaitingEndAck,
    Completed,
    /// The last `begin` failed. Holds the reason shown to the user.
    Failed(String),
}

/// Stop-and-wait send-side state for one outgoing file.
#[derive(Debug)]
pub struct Sender {
    file_name: String,
    /// Content split into Content-frame payloads. Never empty once begun.
    chunks: Vec<String>,
    phase: SenderPhase,
}

impl Default for Sender {
    fn default() -> Self {
        Self::new()
    }
}

impl Sender {
    pub fn new() -> Self {
        Self {
            file_name: String::new(),
            chunks: Vec::new(),
            phase: SenderPhase::Idle,
        }
    }

    /// Load a file and return the encoded Title frame to display.
    ///
    /// Replaces any transfer already in progress. On failure the session
    /// moves to [`SenderPhase::Failed`] and the error is returned.
    pub fn begin(&mut self, file_name: &str, content: &str) -> Result<String, TransferError> {
        if file_name.len() > MAX_FILE_NAME_LEN {
            return Err(self.fail(TransferError::FileNameTooLong {
                len: file_name.len(),
                max: MAX_FILE_NAME_LEN,
            }));
        }

        let title = match Slide::title(file_name).and_then(|s| s.encode()) {
            Ok(title) => title,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.file_name = file_name.to_owned();
        self.chunks = slide::split_content(content);
        self.phase = SenderPhase::AwaitingTitleAck;

        tracing::info!(
            file_name,
            bytes = content.len(),
            chunks = self.chunks.len(),
            "transfer started"
        );
        Ok(title)
    }

    /// Read `path` and [`begin`](Self::begin) sending it.
    pub fn begin_file(&mut self, path: &Path) -> Result<String, TransferError> {
        match read_source(path) {
            Ok(source) => self.begin(&source.file_name, &source.content),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Start over. Drops the loaded file.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Process one decoded symbol from the camera.
    ///
    /// Returns the next frame to display when the symbol acknowledges the
    /// outstanding frame. Everything else is ignored without touching state.
    pub fn on_symbol(&mut self, symbol: &str) -> Option<String> {
        let expected = self.outstanding_index()?;

        let index = match Slide::decode(symbol) {
            Ok(Slide::Confirm { index }) => index,
            Ok(other) => {
                tracing::trace!(kind = ?other.kind(), "sender ignoring non-confirm frame");
                return None;
            }
            Err(e) => {
                tracing::trace!(error = %e, "sender ignoring undecodable symbol");
                return None;
            }
        };

        if index != expected {
            tracing::debug!(index, expected, "ignoring mismatched confirmation");
            return None;
        }

        self.advance()
    }

    fn advance(&mut self) -> Option<String> {
        let next = match &self.phase {
            SenderPhase::AwaitingTitleAck => SenderPhase::SendingContent { chunk: 0 },
            SenderPhase::SendingContent { chunk } if chunk + 1 < self.chunks.len() => {
                SenderPhase::SendingContent { chunk: chunk + 1 }
            }
            SenderPhase::SendingContent { .. } => SenderPhase::AwaitingEndAck,
            SenderPhase::AwaitingEndAck => SenderPhase::Completed,
            SenderPhase::Idle | SenderPhase::Completed | SenderPhase::Failed(_) => return None,
        };
        tracing::debug!(from = ?self.phase, to = ?next, "confirmation accepted");
        self.phase = next;

        if self.phase == SenderPhase::Completed {
            tracing::info!(file_name = %self.file_name, "transfer completed");
            return None;
        }
        self.current_frame()
    }

    /// The Confirm index that acknowledges the frame on screen, if any.
    pub fn outstanding_index(&self) -> Option<u8> {
        match &self.phase {
            SenderPhase::AwaitingTitleAck => Some(0),
            SenderPhase::SendingContent { chunk } => Some(slide::wrap_index(*chunk)),
            SenderPhase::AwaitingEndAck => Some(slide::wrap_index(self.chunks.len())),
            SenderPhase::Idle | SenderPhase::Completed | SenderPhase::Failed(_) => None,
        }
    }

    fn outstanding_slide(&self) -> Option<Slide> {
        match &self.phase {
            SenderPhase::AwaitingTitleAck => Some(Slide::Title {
                file_name: self.file_name.clone(),
            }),
            SenderPhase::SendingContent { chunk } => Some(Slide::Content {
                index: slide::wrap_index(*chunk),
                text: self.chunks.get(*chunk)?.clone(),
            }),
            SenderPhase::AwaitingEndAck => Some(Slide::End),
            SenderPhase::Idle | SenderPhase::Completed | SenderPhase::Failed(_) => None,
        }
    }

    /// Encoded frame that should be on screen right now. Idempotent.
    pub fn current_frame(&self) -> Option<String> {
        let slide = self.outstanding_slide()?;
        match slide.encode() {
            Ok(text) => Some(text),
            Err(e) => {
                // Fields are validated in `begin`; reaching this is a bug.
                tracing::error!(error = %e, "failed to encode outstanding frame");
                None
            }
        }
    }

    pub fn status(&self) -> SenderStatus {
        match &self.phase {
            SenderPhase::Idle => SenderStatus::Ready,
            SenderPhase::AwaitingTitleAck => SenderStatus::AwaitingTitleAck {
                file_name: self.file_name.clone(),
            },
            SenderPhase::SendingContent { chunk } => SenderStatus::AwaitingConfirm {
                current: chunk + 1,
                total: self.chunks.len(),
            },
            SenderPhase::AwaitingEndAck => SenderStatus::AwaitingEndAck,
            SenderPhase::Completed => SenderStatus::Completed,
            SenderPhase::Failed(message) => SenderStatus::Error {
                message: message.clone(),
            },
        }
    }

    pub fn phase(&self) -> &SenderPhase {
        &self.phase
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Number of Content frames in this transfer.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// `true` while a frame is on screen waiting for its confirmation.
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.outstanding_index().is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SenderPhase::Completed
    }

    fn fail(&mut self, err: TransferError) -> TransferError {
        tracing::warn!(error = %err, "transfer could not start");
        self.file_name.clear();
        self.chunks.clear();
        self.phase = SenderPhase::Failed(err.to_string());
        err
    }
}

impl SymbolSession for Sender {
    fn role(&self) -> Role {
        Role::Sender
    }

    fn on_symbol(&mut self, symbol: &str) -> Option<String> {
        Sender::on_symbol(self, symbol)
    }

    fn current_frame(&self) -> Option<String> {
        Sender::current_frame(self)
    }

    fn is_completed(&self) -> bool {
        Sender::is_completed(self)
    }
}
