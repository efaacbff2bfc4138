//! Entry ledger: tickets, pot and round phase in persistent storage.

use soroban_sdk::{xdr::ToXdr, Address, Bytes, BytesN, Env, IntoVal, Val, Vec};

use crate::{DataKey, Error, Phase, PERSISTENT_BUMP_LEDGERS};

/// Seed persistent state for a fresh round so reads never see `None`.
pub(crate) fn open_round(env: &Env) {
    set_persistent(env, &DataKey::Phase, &Phase::Open);
    set_persistent(env, &DataKey::Pot, &0i128);
    set_persistent(env, &DataKey::PlayerCount, &0u32);
    set_persistent(env, &DataKey::EntryDigest, &BytesN::from_array(env, &[0u8; 32]));
}

/// Append `player` as the next ticket and add `amount` to the pot.
///
/// Returns the new ticket's index and the pot after the entry.
pub(crate) fn record_entry(env: &Env, player: &Address, amount: i128) -> Result<(u32, i128), Error> {
    let index = total_players(env);
    let count = index.checked_add(1).ok_or(Error::Overflow)?;
    let pot = pot(env).checked_add(amount).ok_or(Error::Overflow)?;
    let digest = fold_digest(env, &entry_digest(env), player);

    set_persistent(env, &DataKey::Player(index), player);
    set_persistent(env, &DataKey::PlayerCount, &count);
    set_persistent(env, &DataKey::Pot, &pot);
    set_persistent(env, &DataKey::EntryDigest, &digest);

    Ok((index, pot))
}

pub(crate) fn phase(env: &Env) -> Phase {
    env.storage()
        .persistent()
        .get(&DataKey::Phase)
        .unwrap_or(Phase::Open)
}

pub(crate) fn set_phase(env: &Env, phase: &Phase) {
    set_persistent(env, &DataKey::Phase, phase);
}

pub(crate) fn pot(env: &Env) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Pot)
        .unwrap_or(0)
}

pub(crate) fn set_pot(env: &Env, pot: i128) {
    set_persistent(env, &DataKey::Pot, &pot);
}

pub(crate) fn total_players(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::PlayerCount)
        .unwrap_or(0)
}

pub(crate) fn entry_digest(env: &Env) -> BytesN<32> {
    env.storage()
        .persistent()
        .get(&DataKey::EntryDigest)
        .unwrap_or_else(|| BytesN::from_array(env, &[0u8; 32]))
}

/// Ticket holder at `index`.
pub(crate) fn player_at(env: &Env, index: u32) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Player(index))
        .ok_or(Error::NoParticipants)
}

pub(crate) fn players(env: &Env) -> Vec<Address> {
    let mut out = Vec::new(env);
    for index in 0..total_players(env) {
        if let Ok(player) = player_at(env, index) {
            out.push_back(player);
        }
    }
    out
}

/// `sha256(digest || xdr(player))`.
pub(crate) fn fold_digest(env: &Env, digest: &BytesN<32>, player: &Address) -> BytesN<32> {
    let mut preimage = Bytes::from_array(env, &digest.to_array());
    preimage.append(&player.clone().to_xdr(env));
    env.crypto().sha256(&preimage).into()
}

/// Write a persistent entry and extend its TTL in one step.
fn set_persistent<V: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &V) {
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}
