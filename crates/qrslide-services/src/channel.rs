//! Simulated optical channel: one screen seen by one camera.
//!
//! A [`Screen`] shows at most one symbol at a time and keeps showing it until
//! replaced. A [`Camera`] pointed at that screen reads it back once per
//! capture, through a [`NoiseModel`]:
//!
//! - miss: nothing decoded this frame,
//! - truncate: only a prefix of the symbol was decoded,
//! - garble: the leading tag byte was misread.
//!
//! All three produce symbols the slide codec rejects, which is the noise the
//! protocol is built to absorb. Every [`Screen::show`] is a new render with
//! its own generation number, so the capture loop can tell a fresh symbol
//! from one that has merely stayed on screen.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;

use qrslide_core::config::ChannelConfig;

/// Per-capture noise probabilities. All zero means a perfect channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseModel {
    pub miss_rate: f64,
    pub garble_rate: f64,
    pub truncate_rate: f64,
    pub seed: u64,
}

impl NoiseModel {
    pub fn clean() -> Self {
        Self::default()
    }

    /// Same rates, different random stream.
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }
}

impl From<&ChannelConfig> for NoiseModel {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            miss_rate: config.miss_rate,
            garble_rate: config.garble_rate,
            truncate_rate: config.truncate_rate,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Render {
    symbol: String,
    generation: u64,
}

/// One decoded camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub symbol: String,
    /// Which render of the screen this was read from.
    pub generation: u64,
}

/// The displaying end of the channel.
#[derive(Debug)]
pub struct Screen {
    tx: watch::Sender<Option<Render>>,
    generation: u64,
}

impl Screen {
    /// Replace whatever is on screen.
    pub fn show(&mut self, symbol: String) {
        self.generation += 1;
        self.tx.send_replace(Some(Render {
            symbol,
            generation: self.generation,
        }));
    }

    pub fn clear(&mut self) {
        self.tx.send_replace(None);
    }

    /// Symbol on screen right now, without noise.
    pub fn showing(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|r| r.symbol.clone())
    }
}

/// The capturing end of the channel.
#[derive(Debug)]
pub struct Camera {
    rx: watch::Receiver<Option<Render>>,
    noise: NoiseModel,
    rng: StdRng,
}

impl Camera {
    /// Capture one frame. `None` when nothing is on screen or the read missed.
    pub fn capture(&mut self) -> Option<Reading> {
        let Render { symbol, generation } = self.rx.borrow().clone()?;

        if chance(&mut self.rng, self.noise.miss_rate) {
            return None;
        }

        let mut bytes = symbol.into_bytes();
        if !bytes.is_empty() && chance(&mut self.rng, self.noise.truncate_rate) {
            let keep = self.rng.gen_range(0..bytes.len());
            bytes.truncate(keep);
        }
        if !bytes.is_empty() && chance(&mut self.rng, self.noise.garble_rate) {
            // Lowercase letters are never slide tags.
            bytes[0] = self.rng.gen_range(b'a'..=b'z');
        }

        // A QR reader never yields invalid UTF-8; a cut through a multi-byte
        // character counts as a miss.
        let symbol = String::from_utf8(bytes).ok()?;
        Some(Reading { symbol, generation })
    }
}

/// Connect a screen to a camera.
pub fn optical_link(noise: NoiseModel) -> (Screen, Camera) {
    let (tx, rx) = watch::channel(None);
    let screen = Screen { tx, generation: 0 };
    let camera = Camera {
        rx,
        noise,
        rng: StdRng::seed_from_u64(noise.seed),
    };
    (screen, camera)
}

fn chance(rng: &mut StdRng, p: f64) -> bool {
    // Also false for NaN.
    p > 0.0 && rng.gen_bool(p.min(1.0))
}
