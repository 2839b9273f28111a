//! Static true/false quiz bank
//!
//! Quiz-tagged targets carry an id into this table. Lookup is total: a
//! dangling id falls back to the first entry instead of panicking.

use serde::{Deserialize, Serialize};

/// The two answer zones in the quiz arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizAnswer {
    /// True - the left zone
    O,
    /// False - the right zone
    X,
}

/// One bank entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quiz {
    pub id: u32,
    pub statement: &'static str,
    pub answer: QuizAnswer,
}

const BANK: &[Quiz] = &[
    Quiz { id: 1, statement: "A chess board has 64 squares", answer: QuizAnswer::O },
    Quiz { id: 2, statement: "A standard deck holds 54 playing cards", answer: QuizAnswer::X },
    Quiz { id: 3, statement: "Every tetromino is built from four blocks", answer: QuizAnswer::O },
    Quiz { id: 4, statement: "A cube has eight faces", answer: QuizAnswer::X },
    Quiz { id: 5, statement: "Opposite faces of a die always sum to seven", answer: QuizAnswer::O },
    Quiz { id: 6, statement: "A marathon is exactly 40 kilometers long", answer: QuizAnswer::X },
    Quiz { id: 7, statement: "The maximum break in snooker is 147", answer: QuizAnswer::O },
    Quiz { id: 8, statement: "A basketball team fields six players at once", answer: QuizAnswer::X },
    Quiz { id: 9, statement: "A hat-trick means three goals by one player", answer: QuizAnswer::O },
    Quiz { id: 10, statement: "Table tennis games are played to 21 points", answer: QuizAnswer::X },
    Quiz { id: 11, statement: "A standard pinball table has two main flippers", answer: QuizAnswer::O },
    Quiz { id: 12, statement: "The center of a dartboard scores 100 points", answer: QuizAnswer::X },
];

/// The whole bank, in id order
pub fn bank() -> &'static [Quiz] {
    BANK
}

/// Entry for `id`, or the first entry when the id is unknown
pub fn by_id(id: u32) -> &'static Quiz {
    BANK.iter().find(|q| q.id == id).unwrap_or(&BANK[0])
}
