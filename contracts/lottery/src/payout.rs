//! Payout guard: the winner withdraws the pot exactly once.

use soroban_sdk::{token::TokenClient, Address, Env};

use crate::{get_token, ledger, Error, Phase};

/// Settle the round in favour of `caller` and transfer the pot.
///
/// Pot and phase are committed before the token call, so a re-entrant or
/// repeated claim finds the round already settled. A rejected transfer is
/// reported as `TransferFailed`; returning it makes the host discard these
/// writes along with everything else in the invocation.
pub(crate) fn settle(env: &Env, caller: &Address) -> Result<i128, Error> {
    let phase = ledger::phase(env);
    match phase.winner() {
        None => return Err(Error::NoWinnerYet),
        Some(winner) if winner != *caller => return Err(Error::NotWinner),
        Some(_) => {}
    }

    let settled: Phase = phase.settle()?;
    let amount = ledger::pot(env);

    ledger::set_pot(env, 0);
    ledger::set_phase(env, &settled);

    let token = get_token(env)?;
    match TokenClient::new(env, &token).try_transfer(&env.current_contract_address(), caller, &amount) {
        Ok(Ok(())) => Ok(amount),
        _ => Err(Error::TransferFailed),
    }
}
