use crate::*;

use qrslide_core::slide::{Slide, MAX_CONTENT_LEN};
use qrslide_services::SenderPhase;

/// Symbols a camera might plausibly decode that are not the frame expected.
fn junk_for(frame: &str) -> Vec<String> {
    let mut junk = vec![
        String::new(),
        "x".to_string(),
        "hello".to_string(),
        "C".to_string(),
        "D".to_string(),
        "EY".to_string(),
        "Ca".to_string(),
        format!("T{}", " ".repeat(40)),
    ];
    for cut in [1, 2, frame.len() / 2, frame.len().saturating_sub(1)] {
        if cut < frame.len() {
            junk.push(frame[..cut].to_string());
        }
    }
    junk
}

/// Junk before every real frame, in both directions. State must not move
/// on any of it, and the file must still arrive intact.
#[test]
fn test_junk_at_every_step_is_absorbed() {
    let content = sample_text(11 * MAX_CONTENT_LEN + 5);
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let mut frame = sender.begin("noisy.txt", &content).unwrap();
    let mut frames = 0;

    loop {
        frames += 1;
        assert!(frames < 100, "transfer did not finish");

        for junk in junk_for(&frame) {
            let before = receiver.status();
            assert_eq!(receiver.on_symbol(&junk), None, "receiver answered {junk:?}");
            assert_eq!(receiver.status(), before);
        }
        let reply = receiver.on_symbol(&frame);
        if receiver.is_completed() {
            break;
        }
        let confirm = reply.unwrap();

        for junk in junk_for(&confirm) {
            let before = sender.phase().clone();
            assert_eq!(sender.on_symbol(&junk), None, "sender answered {junk:?}");
            assert_eq!(sender.phase(), &before);
        }
        frame = sender.on_symbol(&confirm).unwrap();
    }

    let file = receiver.take_file().unwrap();
    assert_eq!(file.content, content);
    assert_eq!(frames, sender.chunk_count() + 2);
}

/// The sender's own frames reflected back, and confirmations for other
/// chunks, never advance it.
#[test]
fn test_sender_ignores_foreign_frames() {
    let content = sample_text(3 * MAX_CONTENT_LEN);
    let mut sender = Sender::new();
    let title = sender.begin("f.txt", &content).unwrap();
    let d0 = sender.on_symbol("C0").unwrap();

    for symbol in [title.as_str(), d0.as_str(), "EX", "C2", "C9"] {
        assert_eq!(sender.on_symbol(symbol), None, "sender answered {symbol:?}");
    }
    assert_eq!(sender.phase(), &SenderPhase::SendingContent { chunk: 0 });
}

/// A sender that missed our confirmation shows the same chunk again. It is
/// confirmed again and appended once.
#[test]
fn test_retransmitted_chunk_is_reconfirmed_not_duplicated() {
    let content = sample_text(2 * MAX_CONTENT_LEN);
    let mut sender = Sender::new();
    let mut receiver = Receiver::new();
    let title = sender.begin("dup.txt", &content).unwrap();

    let c0 = receiver.on_symbol(&title).unwrap();
    let d0 = sender.on_symbol(&c0).unwrap();
    assert_eq!(receiver.on_symbol(&d0).as_deref(), Some("C0"));
    assert_eq!(receiver.on_symbol(&d0).as_deref(), Some("C0"));
    assert_eq!(receiver.content(), &content[..MAX_CONTENT_LEN]);

    let d1 = sender.on_symbol("C0").unwrap();
    assert_eq!(
        Slide::decode(&d1).unwrap(),
        Slide::content(1, &content[MAX_CONTENT_LEN..]).unwrap()
    );
    assert_eq!(receiver.on_symbol(&d1).as_deref(), Some("C1"));

    // A chunk from further back is neither appended nor confirmed.
    assert_eq!(receiver.on_symbol(&d0), None);

    let end = sender.on_symbol("C1").unwrap();
    assert_eq!(receiver.on_symbol(&end), None);
    assert_eq!(receiver.take_file().unwrap().content, content);
}

/// A second Title mid-transfer does not restart the receiver.
#[test]
fn test_stray_title_mid_transfer_is_ignored() {
    let mut receiver = Receiver::new();
    let first = Slide::title("one.txt").unwrap().encode().unwrap();
    let second = Slide::title("two.txt").unwrap().encode().unwrap();

    assert_eq!(receiver.on_symbol(&first).as_deref(), Some("C0"));
    assert_eq!(receiver.on_symbol(&second), None);
    assert_eq!(receiver.file_name(), "one.txt");
}
