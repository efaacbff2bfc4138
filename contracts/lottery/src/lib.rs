//! Stellarcade Lottery Contract
//!
//! A single-round pooled-stake lottery. Players pay a flat entry fee into a
//! shared pot held by this contract; once the round is decided the selected
//! winner withdraws the whole pot, exactly once.
//!
//! ## Round Lifecycle
//! ```text
//! Open --enter()--> Open
//! Open --pick_winner()--> Decided(winner)
//! Decided --claim_winnings()--> Settled(winner)
//! ```
//! `Settled` is terminal. A new round is a new contract instance.
//!
//! ## Selection Gate
//! The manager may pick a winner once `MANAGER_QUORUM` entries exist. After
//! `BACKUP_WINDOW` seconds from `init`, anyone may force the draw so funds are
//! never locked behind an absent manager.
//!
//! ## Randomness
//! The winner index is derived from ledger metadata, a running digest of all
//! entries and the pot (see `selection`). This is weak randomness: validators
//! can influence ledger metadata. It is isolated behind `RandomnessSource` so
//! a verifiable beacon can be swapped in.
//!
//! ## Storage Strategy
//! - `instance()`: Manager, Token, CreatedAt. Fixed round config.
//! - `persistent()`: Phase, Pot, PlayerCount, EntryDigest and one
//!   `Player(index)` entry per ticket, so the participant list can grow
//!   without rewriting a single large entry.
//!
//! ## Invariant
//! `pot == ENTRY_FEE * total_players` until the pot is claimed, and
//! `pot == token.balance(contract_address)` at all times, assuming all token
//! inflows go through `enter`.
#![no_std]
#![allow(unexpected_cfgs)]

mod ledger;
mod payout;
mod selection;

pub use selection::{LedgerEntropy, RandomnessSource};

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, token::TokenClient,
    Address, Env, Vec,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Persistent storage TTL in ledgers (~30 days at 5 s/ledger).
pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

/// Flat price of one entry: one whole unit of a 7-decimal token (1 XLM).
pub const ENTRY_FEE: i128 = 10_000_000;

/// Seconds after `init` when any caller may force the draw.
pub const BACKUP_WINDOW: u64 = 3_600;

/// Entries required before the manager may draw early.
pub const MANAGER_QUORUM: u32 = 4;

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized     = 2,
    /// `amount` differs from `ENTRY_FEE`.
    InvalidPayment     = 3,
    /// Entries are closed once a winner has been picked.
    RoundClosed        = 4,
    AlreadyDecided     = 5,
    Unauthorized       = 6,
    NoParticipants     = 7,
    NoWinnerYet        = 8,
    NotWinner          = 9,
    AlreadyClaimed     = 10,
    /// The token contract rejected the payout; the claim was rolled back.
    TransferFailed     = 11,
    Overflow           = 12,
}

// ---------------------------------------------------------------------------
// Storage Types
// ---------------------------------------------------------------------------

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Manager,
    Token,
    CreatedAt,
    // --- persistent() ---
    Phase,
    Pot,
    PlayerCount,
    /// Running sha256 over every entrant, in entry order.
    EntryDigest,
    /// Entrant at ticket `index`, zero-based.
    Player(u32),
}

/// Lifecycle of the round. Transitions only move forward.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Open,
    Decided(Address),
    Settled(Address),
}

impl Phase {
    pub fn winner(&self) -> Option<Address> {
        match self {
            Phase::Open => None,
            Phase::Decided(winner) | Phase::Settled(winner) => Some(winner.clone()),
        }
    }

    /// `Open -> Decided(winner)`.
    pub fn decide(self, winner: Address) -> Result<Phase, Error> {
        match self {
            Phase::Open => Ok(Phase::Decided(winner)),
            Phase::Decided(_) | Phase::Settled(_) => Err(Error::AlreadyDecided),
        }
    }

    /// `Decided(winner) -> Settled(winner)`.
    pub fn settle(self) -> Result<Phase, Error> {
        match self {
            Phase::Open => Err(Error::NoWinnerYet),
            Phase::Decided(winner) => Ok(Phase::Settled(winner)),
            Phase::Settled(_) => Err(Error::AlreadyClaimed),
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct Initialized {
    #[topic]
    pub manager: Address,
    pub token: Address,
    pub created_at: u64,
}

#[contractevent]
pub struct Entered {
    #[topic]
    pub player: Address,
    pub index: u32,
    pub pot: i128,
}

#[contractevent]
pub struct WinnerPicked {
    #[topic]
    pub winner: Address,
    pub index: u32,
    pub pot: i128,
}

#[contractevent]
pub struct WinningsClaimed {
    #[topic]
    pub winner: Address,
    pub amount: i128,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct Lottery;

#[contractimpl]
impl Lottery {
    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    /// Open the round. May only be called once.
    ///
    /// `manager` becomes the only address allowed to draw before the backup
    /// window. `token` is the SEP-41 asset entries are paid in, normally the
    /// native XLM Stellar Asset Contract. The backup window is anchored at the
    /// current ledger timestamp.
    pub fn init(env: Env, manager: Address, token: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Manager) {
            return Err(Error::AlreadyInitialized);
        }

        manager.require_auth();

        let created_at = env.ledger().timestamp();
        env.storage().instance().set(&DataKey::Manager, &manager);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage().instance().set(&DataKey::CreatedAt, &created_at);

        ledger::open_round(&env);

        Initialized { manager, token, created_at }.publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // enter
    // -----------------------------------------------------------------------

    /// Buy one ticket for `player`. `amount` must equal `ENTRY_FEE`.
    ///
    /// The same address may enter repeatedly; each entry is a separate ticket
    /// and raises that address's odds proportionally.
    pub fn enter(env: Env, player: Address, amount: i128) -> Result<(), Error> {
        require_initialized(&env)?;

        player.require_auth();

        if amount != ENTRY_FEE {
            return Err(Error::InvalidPayment);
        }
        if ledger::phase(&env) != Phase::Open {
            return Err(Error::RoundClosed);
        }

        let token = get_token(&env)?;
        TokenClient::new(&env, &token).transfer(&player, env.current_contract_address(), &amount);

        let (index, pot) = ledger::record_entry(&env, &player, amount)?;

        Entered { player, index, pot }.publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // pick_winner
    // -----------------------------------------------------------------------

    /// Draw the winner and close the round to new entries.
    ///
    /// Allowed for the manager once `MANAGER_QUORUM` entries exist, or for
    /// anyone once `BACKUP_WINDOW` has elapsed since `init`. Pot and entries
    /// are left untouched.
    pub fn pick_winner(env: Env, caller: Address) -> Result<Address, Error> {
        require_initialized(&env)?;

        caller.require_auth();

        let phase = ledger::phase(&env);
        if phase.winner().is_some() {
            return Err(Error::AlreadyDecided);
        }

        let players = ledger::total_players(&env);
        selection::authorize(&env, &caller, players)?;

        let source = LedgerEntropy::capture(&env);
        let (index, winner) = selection::choose(&env, &source, players)?;

        ledger::set_phase(&env, &phase.decide(winner.clone())?);

        WinnerPicked {
            winner: winner.clone(),
            index,
            pot: ledger::pot(&env),
        }
        .publish(&env);

        Ok(winner)
    }

    // -----------------------------------------------------------------------
    // claim_winnings
    // -----------------------------------------------------------------------

    /// Pay the whole pot to the winner. Succeeds once.
    ///
    /// The pot is zeroed and the round marked settled before the token call.
    /// If the token rejects the transfer this returns `TransferFailed` and the
    /// host rolls every write of this invocation back, leaving the claim open.
    pub fn claim_winnings(env: Env, caller: Address) -> Result<i128, Error> {
        require_initialized(&env)?;

        caller.require_auth();

        let amount = payout::settle(&env, &caller)?;

        WinningsClaimed { winner: caller, amount }.publish(&env);

        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn manager(env: Env) -> Result<Address, Error> {
        get_manager(&env)
    }

    pub fn fee(_env: Env) -> i128 {
        ENTRY_FEE
    }

    pub fn back_up_time(_env: Env) -> u64 {
        BACKUP_WINDOW
    }

    /// Number of tickets sold, counting repeat entries.
    pub fn total_players(env: Env) -> u32 {
        ledger::total_players(&env)
    }

    pub fn pot(env: Env) -> i128 {
        ledger::pot(&env)
    }

    /// The drawn winner, or `None` while the round is open.
    pub fn winner(env: Env) -> Option<Address> {
        ledger::phase(&env).winner()
    }

    pub fn phase(env: Env) -> Result<Phase, Error> {
        require_initialized(&env)?;
        Ok(ledger::phase(&env))
    }

    /// Ledger timestamp captured at `init`; the backup window starts here.
    pub fn created_at(env: Env) -> Result<u64, Error> {
        get_created_at(&env)
    }

    /// All tickets in entry order.
    pub fn players(env: Env) -> Vec<Address> {
        ledger::players(&env)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require_initialized(env: &Env) -> Result<(), Error> {
    if !env.storage().instance().has(&DataKey::Manager) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

pub(crate) fn get_manager(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Manager)
        .ok_or(Error::NotInitialized)
}

pub(crate) fn get_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

pub(crate) fn get_created_at(env: &Env) -> Result<u64, Error> {
    env.storage()
        .instance()
        .get(&DataKey::CreatedAt)
        .ok_or(Error::NotInitialized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
