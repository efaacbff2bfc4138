//! Selection policy: who may draw, and how the winning ticket is chosen.

use soroban_sdk::{Address, Bytes, BytesN, Env};

use crate::{get_created_at, get_manager, ledger, Error, BACKUP_WINDOW, MANAGER_QUORUM};

/// Source of the winning ticket index.
pub trait RandomnessSource {
    /// Return an index in `[0, bound)`. Callers never pass `bound == 0`.
    fn next_index(&self, env: &Env, bound: u32) -> u32;
}

/// Weak, ledger-derived entropy.
///
/// The index is `sha256(sequence_be || timestamp_be || entry_digest || pot_be)`,
/// first 8 bytes read as a big-endian u64, reduced modulo the ticket count.
/// Validators can influence both ledger fields, so this is only suitable while
/// stakes stay small.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerEntropy {
    pub sequence: u32,
    pub timestamp: u64,
    pub entry_digest: BytesN<32>,
    pub pot: i128,
}

impl LedgerEntropy {
    /// Snapshot the current ledger and round state.
    pub fn capture(env: &Env) -> Self {
        LedgerEntropy {
            sequence: env.ledger().sequence(),
            timestamp: env.ledger().timestamp(),
            entry_digest: ledger::entry_digest(env),
            pot: ledger::pot(env),
        }
    }

    fn preimage(&self) -> [u8; 60] {
        let mut preimage = [0u8; 60];
        preimage[..4].copy_from_slice(&self.sequence.to_be_bytes());
        preimage[4..12].copy_from_slice(&self.timestamp.to_be_bytes());
        preimage[12..44].copy_from_slice(&self.entry_digest.to_array());
        preimage[44..].copy_from_slice(&self.pot.to_be_bytes());
        preimage
    }
}

impl RandomnessSource for LedgerEntropy {
    fn next_index(&self, env: &Env, bound: u32) -> u32 {
        let digest: BytesN<32> = env
            .crypto()
            .sha256(&Bytes::from_slice(env, &self.preimage()))
            .into();
        let arr = digest.to_array();
        let raw = u64::from_be_bytes([arr[0], arr[1], arr[2], arr[3], arr[4], arr[5], arr[6], arr[7]]);
        (raw % u64::from(bound)) as u32
    }
}

/// Gate for `pick_winner`.
///
/// The manager may draw once `MANAGER_QUORUM` tickets exist. Once the backup
/// window has elapsed anyone may draw, provided at least one ticket exists.
pub(crate) fn authorize(env: &Env, caller: &Address, players: u32) -> Result<(), Error> {
    if *caller == get_manager(env)? && players >= MANAGER_QUORUM {
        return Ok(());
    }
    if backup_window_elapsed(env)? {
        if players == 0 {
            return Err(Error::NoParticipants);
        }
        return Ok(());
    }
    Err(Error::Unauthorized)
}

pub(crate) fn backup_window_elapsed(env: &Env) -> Result<bool, Error> {
    let deadline = get_created_at(env)?.saturating_add(BACKUP_WINDOW);
    Ok(env.ledger().timestamp() >= deadline)
}

/// Pick a ticket with `source` and resolve it to its holder.
pub(crate) fn choose<R: RandomnessSource>(
    env: &Env,
    source: &R,
    players: u32,
) -> Result<(u32, Address), Error> {
    if players == 0 {
        return Err(Error::NoParticipants);
    }
    let index = source.next_index(env, players);
    let winner = ledger::player_at(env, index)?;
    Ok((index, winner))
}
