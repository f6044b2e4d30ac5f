//! Slide wire format: the frames shown as QR symbols.
//!
//! These types ARE the protocol. Every length, every tag byte and the
//! single-digit index are part of the wire format that any interoperating
//! reader must agree on. Changing anything here is a breaking change.
//!
//! ```text
//!  Title    'T' file_name (space padded)            40 bytes
//!  Content  'D' digit text (space padded)           40 bytes
//!  Confirm  'C' digit                                2 bytes
//!  End      'E' 'X'                                  2 bytes
//! ```
//!
//! Indices travel as one decimal digit, so sequence tracking wraps every
//! ten frames. Padding is stripped on decode, which means trailing spaces
//! in a file name or content chunk do not survive the trip.

use std::str::FromStr;

use static_assertions::const_assert_eq;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Encoded length of Title and Content frames.
pub const LONG_FRAME_LEN: usize = 40;

/// Encoded length of Confirm and End frames.
pub const SHORT_FRAME_LEN: usize = 2;

/// Maximum file name length in bytes carried by a Title frame.
pub const MAX_FILE_NAME_LEN: usize = 39;

/// Maximum text length in bytes carried by a Content frame.
pub const MAX_CONTENT_LEN: usize = 38;

/// Indices are stored and compared modulo this value (one decimal digit).
pub const INDEX_MODULUS: usize = 10;

/// Second byte of every End frame.
pub const END_MARKER: u8 = b'X';

const PADDING: char = ' ';

// Compile-time layout guards. If these fail, the wire format has silently changed.
const_assert_eq!(LONG_FRAME_LEN, 1 + MAX_FILE_NAME_LEN);
const_assert_eq!(LONG_FRAME_LEN, 2 + MAX_CONTENT_LEN);
const_assert_eq!(INDEX_MODULUS, 10);

// ── Slide kind ────────────────────────────────────────────────────────────────

/// The variant tag carried in the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    Title,
    Content,
    Confirm,
    End,
}

impl SlideKind {
    /// Leading byte on the wire.
    pub fn tag(self) -> u8 {
        match self {
            SlideKind::Title => b'T',
            SlideKind::Content => b'D',
            SlideKind::Confirm => b'C',
            SlideKind::End => b'E',
        }
    }

    /// Exact encoded length of a frame of this kind.
    pub fn encoded_len(self) -> usize {
        match self {
            SlideKind::Title | SlideKind::Content => LONG_FRAME_LEN,
            SlideKind::Confirm | SlideKind::End => SHORT_FRAME_LEN,
        }
    }
}

impl TryFrom<u8> for SlideKind {
    type Error = FrameDefect;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'T' => Ok(SlideKind::Title),
            b'D' => Ok(SlideKind::Content),
            b'C' => Ok(SlideKind::Confirm),
            b'E' => Ok(SlideKind::End),
            other => Err(FrameDefect::UnknownKind(other)),
        }
    }
}

// ── Slide ─────────────────────────────────────────────────────────────────────

/// One frame of a transfer.
///
/// `index` fields hold the already-wrapped digit (`0..=9`). Build slides
/// through [`Slide::title`], [`Slide::content`] and [`Slide::confirm`] to
/// get length checks and index wrapping for free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slide {
    /// First frame of a transfer. Names the file.
    Title { file_name: String },
    /// A chunk of file content.
    Content { index: u8, text: String },
    /// Receiver acknowledgement of the frame with this index.
    Confirm { index: u8 },
    /// Transfer finished.
    End,
}

impl Slide {
    pub fn title(file_name: impl Into<String>) -> Result<Self, SlideError> {
        let file_name = file_name.into();
        check_field("file name", &file_name, MAX_FILE_NAME_LEN)?;
        Ok(Slide::Title { file_name })
    }

    /// Content frame for chunk number `chunk`. Only the unit digit is kept.
    pub fn content(chunk: usize, text: impl Into<String>) -> Result<Self, SlideError> {
        let text = text.into();
        check_field("content text", &text, MAX_CONTENT_LEN)?;
        Ok(Slide::Content {
            index: wrap_index(chunk),
            text,
        })
    }

    /// Confirmation of chunk number `chunk`. Only the unit digit is kept.
    pub fn confirm(chunk: usize) -> Self {
        Slide::Confirm {
            index: wrap_index(chunk),
        }
    }

    pub fn kind(&self) -> SlideKind {
        match self {
            Slide::Title { .. } => SlideKind::Title,
            Slide::Content { .. } => SlideKind::Content,
            Slide::Confirm { .. } => SlideKind::Confirm,
            Slide::End => SlideKind::End,
        }
    }

    /// Serialise into the fixed-width text carried by one QR symbol.
    ///
    /// Fails with [`SlideError::InvalidField`] when a payload field is
    /// longer than its slot.
    pub fn encode(&self) -> Result<String, SlideError> {
        let kind = self.kind();
        let mut out = String::with_capacity(kind.encoded_len());
        out.push(kind.tag() as char);

        match self {
            Slide::Title { file_name } => {
                check_field("file name", file_name, MAX_FILE_NAME_LEN)?;
                push_padded(&mut out, file_name, MAX_FILE_NAME_LEN);
            }
            Slide::Content { index, text } => {
                check_field("content text", text, MAX_CONTENT_LEN)?;
                out.push(index_digit(*index));
                push_padded(&mut out, text, MAX_CONTENT_LEN);
            }
            Slide::Confirm { index } => out.push(index_digit(*index)),
            Slide::End => out.push(END_MARKER as char),
        }

        debug_assert_eq!(out.len(), kind.encoded_len());
        Ok(out)
    }

    /// Parse one decoded QR symbol.
    ///
    /// Returns [`SlideError::MalformedFrame`] unless `symbol` matches one of
    /// the four exact shapes.
    pub fn decode(symbol: &str) -> Result<Self, SlideError> {
        let bytes = symbol.as_bytes();
        let first = *bytes.first().ok_or(FrameDefect::Empty)?;
        let kind = SlideKind::try_from(first)?;

        let expected = kind.encoded_len();
        if bytes.len() != expected {
            return Err(FrameDefect::LengthMismatch {
                kind,
                expected,
                actual: bytes.len(),
            }
            .into());
        }

        // Byte 0 (and byte 1 for indexed kinds) is ASCII once validated,
        // so the slices below always start on a char boundary.
        let slide = match kind {
            SlideKind::Title => Slide::Title {
                file_name: unpad(&symbol[1..]),
            },
            SlideKind::Content => {
                let index = parse_index(bytes[1])?;
                Slide::Content {
                    index,
                    text: unpad(&symbol[2..]),
                }
            }
            SlideKind::Confirm => Slide::Confirm {
                index: parse_index(bytes[1])?,
            },
            SlideKind::End => {
                if bytes[1] != END_MARKER {
                    return Err(FrameDefect::BadEndMarker(bytes[1]).into());
                }
                Slide::End
            }
        };
        Ok(slide)
    }
}

impl FromStr for Slide {
    type Err = SlideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slide::decode(s)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Reduce a chunk number to the single digit carried on the wire.
pub fn wrap_index(chunk: usize) -> u8 {
    (chunk % INDEX_MODULUS) as u8
}

/// Split file content into Content-sized chunks.
///
/// Chunks are at most [`MAX_CONTENT_LEN`] bytes and never split a UTF-8
/// character. Empty content still yields one (empty) chunk.
pub fn split_content(content: &str) -> Vec<String> {
    let mut chunks = Vec::with_capacity(content.len() / MAX_CONTENT_LEN + 1);
    let mut rest = content;

    while !rest.is_empty() {
        let mut cut = rest.len().min(MAX_CONTENT_LEN);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head.to_owned());
        rest = tail;
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<(), SlideError> {
    if value.len() > max {
        return Err(SlideError::InvalidField {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

// Pads by bytes, not chars: `format!("{:<39}")` would count chars and
// overrun the slot for non-ASCII names.
fn push_padded(out: &mut String, value: &str, width: usize) {
    out.push_str(value);
    out.extend(std::iter::repeat(PADDING).take(width - value.len()));
}

fn unpad(value: &str) -> String {
    value.trim_end_matches(PADDING).to_owned()
}

fn index_digit(index: u8) -> char {
    char::from(b'0' + index % INDEX_MODULUS as u8)
}

fn parse_index(byte: u8) -> Result<u8, FrameDefect> {
    if byte.is_ascii_digit() {
        Ok(byte - b'0')
    } else {
        Err(FrameDefect::NonDigitIndex(byte))
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a symbol failed to parse as a slide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameDefect {
    #[error("empty symbol")]
    Empty,

    #[error("unknown slide kind byte: 0x{0:02x}")]
    UnknownKind(u8),

    #[error("{kind:?} frame must be {expected} bytes, got {actual}")]
    LengthMismatch {
        kind: SlideKind,
        expected: usize,
        actual: usize,
    },

    #[error("index byte 0x{0:02x} is not an ASCII digit")]
    NonDigitIndex(u8),

    #[error("end marker must be 'X', got 0x{0:02x}")]
    BadEndMarker(u8),
}

/// Errors that can arise when encoding or decoding slides.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlideError {
    #[error("{field} is {len} bytes, exceeds maximum {max}")]
    InvalidField {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] FrameDefect),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
