use crate::*;

use qrslide_core::slide::{Slide, MAX_CONTENT_LEN};
use qrslide_services::{ReceiverPhase, SenderPhase, SenderStatus, TransferError};

/// One short file, checked symbol for symbol.
#[test]
fn test_hello_world_exact_frames() {
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin("a.txt", "hello world").unwrap();

    let transcript = lockstep(&mut sender, &mut receiver, title, 10).unwrap();

    assert_eq!(
        transcript.sent,
        vec![
            format!("Ta.txt{}", " ".repeat(34)),
            format!("D0hello world{}", " ".repeat(27)),
            "EX".to_string(),
        ]
    );
    assert_eq!(transcript.confirms, vec!["C0", "C0"]);
    assert!(transcript.sent.iter().take(2).all(|f| f.len() == 40));

    let file = receiver.take_file().unwrap();
    assert_eq!(file.file_name, "a.txt");
    assert_eq!(file.content, "hello world");
    assert!(receiver.take_file().is_none(), "file handed out twice");

    // The receiver never confirms End, so the sender is left waiting on it.
    assert_eq!(sender.phase(), &SenderPhase::AwaitingEndAck);
    assert_eq!(sender.outstanding_index(), Some(1));
}

/// Twelve chunks: indices run 0..9 then wrap to 0, 1.
#[test]
fn test_index_wraps_after_ten_chunks() {
    let content = sample_text(12 * MAX_CONTENT_LEN);
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin("big.txt", &content).unwrap();
    assert_eq!(sender.chunk_count(), 12);

    let transcript = lockstep(&mut sender, &mut receiver, title, 100).unwrap();

    // Title, 12 content frames, End.
    assert_eq!(transcript.sent.len(), 14);
    let indices: Vec<u8> = transcript.sent[1..13]
        .iter()
        .map(|frame| match Slide::decode(frame).unwrap() {
            Slide::Content { index, .. } => index,
            other => panic!("expected content frame, got {other:?}"),
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1]);
    assert_eq!(transcript.sent[13], "EX");

    assert_eq!(receiver.content(), content);
    assert_eq!(sender.outstanding_index(), Some(2));
}

/// A file of N chunks finishes in exactly N + 2 sender frames.
#[test]
fn test_frame_count_is_chunks_plus_two() {
    for len in [1, MAX_CONTENT_LEN, MAX_CONTENT_LEN + 1, 5 * MAX_CONTENT_LEN - 3] {
        let content = sample_text(len);
        let mut sender = Sender::new();
        let mut receiver = Receiver::new();
        let title = sender.begin("n.txt", &content).unwrap();
        let chunks = sender.chunk_count();

        let transcript = lockstep(&mut sender, &mut receiver, title, 100).unwrap();
        assert_eq!(transcript.sent.len(), chunks + 2, "content length {len}");
        assert_eq!(receiver.content(), content);
    }
}

#[test]
fn test_empty_file_sends_one_blank_chunk() {
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin("empty.txt", "").unwrap();

    let transcript = lockstep(&mut sender, &mut receiver, title, 10).unwrap();
    assert_eq!(transcript.sent.len(), 3);
    assert_eq!(transcript.sent[1], format!("D0{}", " ".repeat(38)));

    let file = receiver.take_file().unwrap();
    assert_eq!(file.file_name, "empty.txt");
    assert_eq!(file.content, "");
}

#[test]
fn test_multibyte_content_survives() {
    let content = "ünïcødé✓".repeat(20);
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin("utf8.txt", &content).unwrap();

    lockstep(&mut sender, &mut receiver, title, 100).unwrap();
    assert_eq!(receiver.take_file().unwrap().content, content);
}

#[test]
fn test_overlong_file_name_is_refused() {
    let mut sender = Sender::new();
    let err = sender.begin(&"n".repeat(40), "text").unwrap_err();

    assert!(matches!(err, TransferError::FileNameTooLong { len: 40, max: 39 }));
    assert!(matches!(sender.status(), SenderStatus::Error { .. }));
    assert_eq!(sender.current_frame(), None);

    // A valid begin afterwards recovers the session.
    let title = sender.begin(&"n".repeat(39), "text").unwrap();
    assert_eq!(title.len(), 40);
}

#[test]
fn test_begin_file_reads_from_disk() {
    let dir = scratch_dir("begin-file");
    let path = dir.join("disk.txt");
    std::fs::write(&path, "from disk").unwrap();

    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin_file(&path).unwrap();
    lockstep(&mut sender, &mut receiver, title, 10).unwrap();

    let file = receiver.take_file().unwrap();
    assert_eq!(file.file_name, "disk.txt");
    assert_eq!(file.content, "from disk");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_status_reports_progress() {
    let content = sample_text(3 * MAX_CONTENT_LEN);
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin("s.txt", &content).unwrap();

    let d0 = sender.on_symbol(&receiver.on_symbol(&title).unwrap()).unwrap();
    assert_eq!(
        sender.status(),
        SenderStatus::AwaitingConfirm {
            current: 1,
            total: 3
        }
    );
    receiver.on_symbol(&d0).unwrap();
    assert_eq!(receiver.status().to_string(), "File: s.txt, received 1 slides");

    let report = serde_json::to_value(receiver.status()).unwrap();
    assert_eq!(report["state"], "receiving");
    assert_eq!(report["file_name"], "s.txt");
    assert_eq!(report["received"], 1);
    assert_eq!(receiver.phase(), ReceiverPhase::ReceivingContent);
}
