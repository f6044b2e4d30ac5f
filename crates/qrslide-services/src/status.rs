//! Human-readable transfer status, derived from session state.

use std::fmt;

use serde::Serialize;

/// What the sending side is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SenderStatus {
    Ready,
    AwaitingTitleAck { file_name: String },
    AwaitingConfirm { current: usize, total: usize },
    AwaitingEndAck,
    Completed,
    Error { message: String },
}

/// What the receiving side is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReceiverStatus {
    WaitingForFile,
    Receiving { file_name: String, received: usize },
    Completed { file_name: String },
}

impl fmt::Display for SenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderStatus::Ready => write!(f, "Ready to transfer"),
            SenderStatus::AwaitingTitleAck { .. } => {
                write!(f, "Waiting for receiver to acknowledge file details")
            }
            SenderStatus::AwaitingConfirm { current, total } => {
                write!(f, "Waiting for confirmation of slide {current}/{total}")
            }
            SenderStatus::AwaitingEndAck => {
                write!(f, "Waiting for receiver to acknowledge end of file")
            }
            SenderStatus::Completed => write!(f, "Transfer completed"),
            SenderStatus::Error { message } => write!(f, "Error: {message}"),
        }
    }
}

impl fmt::Display for ReceiverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiverStatus::WaitingForFile => write!(f, "Waiting for file details"),
            ReceiverStatus::Receiving {
                file_name,
                received,
            } => write!(f, "File: {file_name}, received {received} slides"),
            ReceiverStatus::Completed { file_name } => {
                write!(f, "Transfer completed: {file_name}")
            }
        }
    }
}
