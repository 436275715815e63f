//! Identifier generation for newly written records
//!
//! Encoding a new tab group needs a fresh window id, one fresh tab id per
//! tab, and a fresh group token. These come from an [`IdSource`] handed to
//! the encoder so tests can pin every byte of the output.

use rand::Rng;
use rand::rngs::ThreadRng;

use crate::token::GroupToken;

/// Source of session ids and group tokens
pub trait IdSource {
    /// Next tab or window id
    fn next_session_id(&mut self) -> u32;

    /// A fresh, non-empty group token
    fn next_group_token(&mut self) -> GroupToken;
}

/// Production id source.
///
/// Session ids come from a counter seeded once from the wall clock, with a
/// random low component so two processes started in the same millisecond
/// diverge. Tokens are drawn from the thread-local CSPRNG.
pub struct SystemIdSource {
    next: u32,
    rng: ThreadRng,
}

impl SystemIdSource {
    pub fn new() -> Self {
        let mut rng = rand::rng();
        let millis = chrono::Utc::now().timestamp_millis() as u64;
        let seed = (millis as u32) ^ u32::from(rng.random::<u16>());
        Self { next: seed, rng }
    }
}

impl Default for SystemIdSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SystemIdSource {
    fn next_session_id(&mut self) -> u32 {
        // 0 is never a valid session id
        if self.next == 0 {
            self.next = 1;
        }
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    fn next_group_token(&mut self) -> GroupToken {
        loop {
            let token = GroupToken::new(self.rng.random(), self.rng.random());
            if !token.is_empty() {
                return token;
            }
        }
    }
}

/// Deterministic id source for tests and reproducible output.
///
/// Ids count up from `start`; tokens share `token_high` and count up in the
/// low half starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIdSource {
    next_id: u32,
    token_high: u64,
    next_token_low: u64,
}

impl SequentialIdSource {
    pub fn new(start: u32, token_high: u64) -> Self {
        Self {
            next_id: start,
            token_high,
            next_token_low: 1,
        }
    }
}

impl IdSource for SequentialIdSource {
    fn next_session_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn next_group_token(&mut self) -> GroupToken {
        let token = GroupToken::new(self.token_high, self.next_token_low);
        self.next_token_low = self.next_token_low.wrapping_add(1);
        token
    }
}
