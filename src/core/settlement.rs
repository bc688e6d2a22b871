//! Minimal settlement: turns net positions into a short list of transfers
//! that leaves everyone square.

use crate::core::roster::ParticipantId;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// Amounts below this are considered settled.
pub const DUST: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

/// Transfers that bring every net position to zero.
///
/// `net` maps each participant to what they paid minus their share: positive
/// means they are owed money. The largest debtor repeatedly pays the largest
/// creditor, which needs at most `n - 1` transfers.
pub fn minimal_transfers(net: &BTreeMap<ParticipantId, Decimal>) -> Vec<Transfer> {
    let mut creditors: Vec<(ParticipantId, Decimal)> = Vec::new();
    let mut debtors: Vec<(ParticipantId, Decimal)> = Vec::new();
    for (id, amount) in net {
        if *amount >= DUST {
            creditors.push((id.clone(), *amount));
        } else if *amount <= -DUST {
            debtors.push((id.clone(), -*amount));
        }
    }

    let mut transfers = Vec::new();
    loop {
        // Ties resolve to the first participant in id order
        let Some(ci) = largest(&creditors) else { break };
        let Some(di) = largest(&debtors) else { break };

        let amount = creditors[ci].1.min(debtors[di].1);
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded >= DUST {
            transfers.push(Transfer {
                from: debtors[di].0.clone(),
                to: creditors[ci].0.clone(),
                amount: rounded,
            });
        }
        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;
        creditors.retain(|(_, left)| *left >= DUST);
        debtors.retain(|(_, left)| *left >= DUST);
    }
    transfers
}

fn largest(side: &[(ParticipantId, Decimal)]) -> Option<usize> {
    side.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, Decimal)>, (i, (_, amount))| match best {
            Some((_, top)) if top >= *amount => best,
            _ => Some((i, *amount)),
        })
        .map(|(i, _)| i)
}
