use crate::*;

use qrslide_core::config::QrslideConfig;
use qrslide_core::slide::MAX_CONTENT_LEN;
use qrslide_services::{persist, run_loopback, NoiseModel, ReceiverStatus, SenderPhase};

fn noisy(seed: u64) -> NoiseModel {
    NoiseModel {
        miss_rate: 0.3,
        garble_rate: 0.1,
        truncate_rate: 0.1,
        seed,
    }
}

/// Screen to camera and back over a lossy channel, then onto disk.
#[tokio::test]
async fn test_noisy_loopback_saves_identical_file() {
    let content = sample_text(5 * MAX_CONTENT_LEN + 17);
    let mut sender = Sender::new();
    sender.begin("loop.txt", &content).unwrap();

    let outcome = run_loopback(sender, Receiver::new(), noisy(1234), &fast_capture())
        .await
        .unwrap();
    assert_eq!(outcome.sender.phase(), &SenderPhase::AwaitingEndAck);
    assert!(outcome.receiver_frames >= 8);

    let mut receiver = outcome.receiver;
    assert_eq!(
        receiver.status(),
        ReceiverStatus::Completed {
            file_name: "loop.txt".into()
        }
    );

    let dir = scratch_dir("loopback");
    let file = receiver.take_file().unwrap();
    let path = persist(&dir, &file).unwrap();
    assert_eq!(path, dir.join("loop.txt"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);

    let _ = std::fs::remove_dir_all(&dir);
}

/// Index wrap-around under noise, across several random streams.
#[tokio::test]
async fn test_wraparound_survives_noise_for_many_seeds() {
    let content = sample_text(23 * MAX_CONTENT_LEN);
    for seed in [1, 2, 3, 99] {
        let mut sender = Sender::new();
        sender.begin("wrap.txt", &content).unwrap();

        let outcome = run_loopback(sender, Receiver::new(), noisy(seed), &fast_capture())
            .await
            .unwrap();
        assert_eq!(outcome.receiver.content(), content, "seed {seed}");
    }
}

/// The shipped channel defaults are good enough to finish a transfer.
#[tokio::test]
async fn test_default_channel_config_completes() {
    let config = QrslideConfig::default();
    let content = sample_text(2 * MAX_CONTENT_LEN);
    let mut sender = Sender::new();
    sender.begin("defaults.txt", &content).unwrap();

    let outcome = run_loopback(
        sender,
        Receiver::new(),
        NoiseModel::from(&config.channel),
        &fast_capture(),
    )
    .await
    .unwrap();
    assert!(outcome.receiver.is_completed());
    assert_eq!(outcome.receiver.content(), content);
}

/// A received name that would escape the output directory is not written.
#[tokio::test]
async fn test_unsafe_received_name_is_not_persisted() {
    let mut sender = Sender::new();
    sender.begin("../escape.txt", "nope").unwrap();

    let outcome = run_loopback(sender, Receiver::new(), NoiseModel::clean(), &fast_capture())
        .await
        .unwrap();

    let dir = scratch_dir("unsafe-name");
    let mut receiver = outcome.receiver;
    let file = receiver.take_file().unwrap();
    assert!(persist(&dir, &file).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
