use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::shapes::PieceKind;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RandomizerKind {
    /// Every draw is independent.
    #[default]
    Uniform,
    /// All seven kinds are dealt once per shuffled bag.
    Bag7,
}

/// Seeded piece source with a look-ahead queue.
#[derive(Debug, Clone)]
pub struct Randomizer {
    kind: RandomizerKind,
    rng: StdRng,
    bag: Vec<PieceKind>,
    preview: VecDeque<PieceKind>,
    preview_len: usize,
}

impl Randomizer {
    pub fn new(kind: RandomizerKind, seed: u64, preview_len: usize) -> Self {
        let mut randomizer = Self {
            kind,
            rng: StdRng::seed_from_u64(seed),
            bag: Vec::with_capacity(PieceKind::ALL.len()),
            preview: VecDeque::with_capacity(preview_len + 1),
            preview_len,
        };
        randomizer.fill_preview();
        randomizer
    }

    pub fn kind(&self) -> RandomizerKind {
        self.kind
    }

    /// Upcoming kinds, next first.
    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.preview.iter().copied()
    }

    pub fn next_kind(&mut self) -> PieceKind {
        let kind = match self.preview.pop_front() {
            Some(kind) => kind,
            None => self.draw(),
        };
        self.fill_preview();
        kind
    }

    fn fill_preview(&mut self) {
        while self.preview.len() < self.preview_len {
            let kind = self.draw();
            self.preview.push_back(kind);
        }
    }

    fn draw(&mut self) -> PieceKind {
        match self.kind {
            RandomizerKind::Uniform => {
                PieceKind::ALL[self.rng.gen_range(0..PieceKind::ALL.len())]
            }
            RandomizerKind::Bag7 => {
                if self.bag.is_empty() {
                    self.bag.extend_from_slice(&PieceKind::ALL);
                    self.bag.shuffle(&mut self.rng);
                }
                // Refilled just above, so the bag is never empty here.
                self.bag.pop().unwrap_or(PieceKind::O)
            }
        }
    }
}
