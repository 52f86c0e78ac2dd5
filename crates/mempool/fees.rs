//! Fee-market ordering and replacement pricing.
//!
//! Two concerns live here: the total order a block producer drains the pool
//! in (effective price under EIP-1559 semantics), and the bump rules deciding
//! whether a same-sender same-nonce transaction may displace a pooled one.

use std::cmp::Ordering;

use vesper_common::{
    U256,
    types::{Transaction, TxType},
};

use crate::{
    constants::{BLOB_PRICE_BUMP_PERCENTAGE, MIN_PRICE_BUMP_PERCENTAGE},
    error::MempoolError,
};

/// Per-gas price actually paid under `base_fee`.
///
/// With a base fee, this is `base + min(max_priority, max_fee - base)`,
/// capped at `max_fee` when the cap cannot cover the base fee. Without one
/// (pre-1559 rules), raw gas price decides.
pub fn effective_gas_price(transaction: &Transaction, base_fee: Option<u64>) -> u64 {
    let (max_fee, max_priority) = transaction.normalized_fees();
    match base_fee {
        Some(base) => {
            if max_fee >= base {
                base + max_priority.min(max_fee - base)
            } else {
                max_fee
            }
        }
        None => transaction.gas_price().unwrap_or(max_priority),
    }
}

/// Total order on transactions by proposer revenue: `Ordering::Less` means
/// `a` is the higher-priority transaction. Ties on effective price fall back
/// to the fee cap; transactions equal on both compare equal.
pub fn compare_by_effective_price(
    a: &Transaction,
    b: &Transaction,
    base_fee: Option<u64>,
) -> Ordering {
    let price_a = effective_gas_price(a, base_fee);
    let price_b = effective_gas_price(b, base_fee);
    match price_b.cmp(&price_a) {
        Ordering::Equal => {
            let (fee_cap_a, _) = a.normalized_fees();
            let (fee_cap_b, _) = b.normalized_fees();
            fee_cap_b.cmp(&fee_cap_a)
        }
        ordering => ordering,
    }
}

/// Whether the transaction can pay for inclusion at `base_fee` at all.
pub fn validate_against_base_fee(
    transaction: &Transaction,
    base_fee: u64,
) -> Result<(), MempoolError> {
    match transaction.gas_price() {
        Some(gas_price) => {
            if gas_price < base_fee {
                return Err(MempoolError::GasPriceBelowBaseFee);
            }
        }
        None => {
            if transaction.max_fee_per_gas().unwrap_or(0) < base_fee {
                return Err(MempoolError::InsufficientMaxFeePerGas);
            }
        }
    }
    Ok(())
}

/// Replacement admission for a same-sender same-nonce pair.
///
/// Blob and non-blob transactions never replace each other. Fixed-price
/// incumbents ask a 10 % bump on the gas price, so a zero-fee incumbent is
/// always replaceable. Dynamic-fee incumbents ask the 10 % bump on both the
/// fee cap and the priority fee, with equal fees never sufficient. Blob
/// incumbents ask a 100 % bump on all three fee dimensions and at least as
/// many versioned hashes as they carry.
pub fn replacement_allowed(incoming: &Transaction, existing: &Transaction) -> bool {
    let incoming_is_blob = incoming.tx_type() == TxType::EIP4844;
    let existing_is_blob = existing.tx_type() == TxType::EIP4844;
    if incoming_is_blob != existing_is_blob {
        return false;
    }
    if incoming_is_blob {
        return blob_replacement_allowed(incoming, existing);
    }

    match (incoming.gas_price(), existing.gas_price()) {
        (Some(new_price), Some(old_price)) => new_price >= fixed_price_bump(old_price),
        _ => {
            let (new_fee_cap, new_priority) = incoming.normalized_fees();
            let (old_fee_cap, old_priority) = existing.normalized_fees();
            new_fee_cap >= dynamic_fee_bump(old_fee_cap)
                && new_priority >= dynamic_fee_bump(old_priority)
        }
    }
}

fn blob_replacement_allowed(incoming: &Transaction, existing: &Transaction) -> bool {
    if incoming.blob_versioned_hashes().len() < existing.blob_versioned_hashes().len() {
        return false;
    }
    let (new_fee_cap, new_priority) = incoming.normalized_fees();
    let (old_fee_cap, old_priority) = existing.normalized_fees();
    let new_blob_fee = incoming.max_fee_per_blob_gas().unwrap_or_default();
    let old_blob_fee = existing.max_fee_per_blob_gas().unwrap_or_default();

    new_fee_cap >= blob_fee_bump(old_fee_cap)
        && new_priority >= blob_fee_bump(old_priority)
        && new_blob_fee >= blob_fee_bump_u256(old_blob_fee)
}

/// `old + old * 10 %`, in the overflow-free additive form.
fn fixed_price_bump(old: u64) -> u64 {
    old.saturating_add(old / (100 / MIN_PRICE_BUMP_PERCENTAGE))
}

/// As [`fixed_price_bump`], but a bump floor that rounds to zero never lets
/// equal fees replace.
fn dynamic_fee_bump(old: u64) -> u64 {
    old.saturating_add((old / (100 / MIN_PRICE_BUMP_PERCENTAGE)).max(1))
}

fn blob_fee_bump(old: u64) -> u64 {
    let bump = (u128::from(old) * u128::from(BLOB_PRICE_BUMP_PERCENTAGE) / 100).max(1);
    u128::from(old)
        .saturating_add(bump)
        .min(u128::from(u64::MAX)) as u64
}

fn blob_fee_bump_u256(old: U256) -> U256 {
    let bump = (old.saturating_mul(U256::from(BLOB_PRICE_BUMP_PERCENTAGE)) / U256::from(100))
        .max(U256::one());
    old.saturating_add(bump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{signed_1559, signed_blob, signed_legacy};

    #[test]
    fn legacy_replacement_boundary_is_exactly_ten_percent() {
        for gas_price in [10u64, 15, 100, 109, 1000] {
            let existing = signed_legacy(0, gas_price);
            let bump = gas_price / 10;
            assert!(
                replacement_allowed(&signed_legacy(0, gas_price + bump), &existing),
                "gas price {gas_price} + {bump} must replace"
            );
            assert!(
                !replacement_allowed(&signed_legacy(0, gas_price + bump - 1), &existing),
                "gas price {gas_price} + {bump} - 1 must not replace"
            );
        }
    }

    #[test]
    fn zero_fee_legacy_incumbent_is_always_replaceable() {
        let existing = signed_legacy(0, 0);
        assert!(replacement_allowed(&signed_legacy(0, 0), &existing));
        assert!(replacement_allowed(&signed_legacy(0, 1), &existing));
    }

    #[test]
    fn dynamic_replacement_needs_the_bump_on_both_dimensions() {
        let existing = signed_1559(0, 100, 200, 100_000);
        assert!(replacement_allowed(&signed_1559(0, 110, 220, 100_000), &existing));
        // Priority bumped, fee cap short by one.
        assert!(!replacement_allowed(&signed_1559(0, 110, 219, 100_000), &existing));
        // Fee cap bumped, priority short by one.
        assert!(!replacement_allowed(&signed_1559(0, 109, 220, 100_000), &existing));
    }

    #[test]
    fn equal_dynamic_fees_never_replace() {
        let existing = signed_1559(0, 1, 2, 100_000);
        assert!(!replacement_allowed(&signed_1559(0, 1, 2, 100_001), &existing));
        // Small fees still need a strict increase.
        assert!(replacement_allowed(&signed_1559(0, 2, 3, 100_000), &existing));

        let zero_fee = signed_1559(0, 0, 0, 100_000);
        assert!(!replacement_allowed(&signed_1559(0, 0, 0, 100_000), &zero_fee));
        assert!(replacement_allowed(&signed_1559(0, 1, 1, 100_000), &zero_fee));
    }

    #[test]
    fn dynamic_incoming_may_replace_legacy_incumbent() {
        let existing = signed_legacy(0, 100);
        // Both dimensions measured against the legacy gas price.
        assert!(replacement_allowed(&signed_1559(0, 110, 110, 100_000), &existing));
        assert!(!replacement_allowed(&signed_1559(0, 110, 109, 100_000), &existing));
    }

    #[test]
    fn blob_replacement_needs_double_fees_everywhere() {
        let existing = signed_blob(0, 10, 20, 30, 2);
        assert!(replacement_allowed(&signed_blob(0, 20, 40, 60, 2), &existing));
        assert!(!replacement_allowed(&signed_blob(0, 20, 40, 59, 2), &existing));
        assert!(!replacement_allowed(&signed_blob(0, 20, 39, 60, 2), &existing));
        assert!(!replacement_allowed(&signed_blob(0, 19, 40, 60, 2), &existing));
    }

    #[test]
    fn blob_replacement_cannot_shed_versioned_hashes() {
        let existing = signed_blob(0, 10, 20, 30, 2);
        assert!(!replacement_allowed(&signed_blob(0, 20, 40, 60, 1), &existing));
        assert!(replacement_allowed(&signed_blob(0, 20, 40, 60, 3), &existing));
    }

    #[test]
    fn blob_and_plain_transactions_never_replace_each_other() {
        let blob = signed_blob(0, 10, 20, 30, 1);
        let plain = signed_1559(0, 1000, 2000, 100_000);
        assert!(!replacement_allowed(&plain, &blob));
        assert!(!replacement_allowed(&blob, &plain));
    }

    #[test]
    fn effective_price_follows_the_1559_formula() {
        let tx = signed_1559(0, 2, 10, 100_000);
        assert_eq!(effective_gas_price(&tx, Some(5)), 7);
        // Tip clipped by the fee gap.
        assert_eq!(effective_gas_price(&tx, Some(9)), 10);
        // Cap under the base fee: the cap itself.
        assert_eq!(effective_gas_price(&tx, Some(11)), 10);
        // No base fee: raw bid.
        assert_eq!(effective_gas_price(&signed_legacy(0, 7), None), 7);
    }

    #[test]
    fn ordering_is_by_effective_price_then_fee_cap() {
        let cheap = signed_1559(0, 1, 10, 100_000);
        let rich = signed_1559(0, 5, 10, 100_000);
        assert_eq!(compare_by_effective_price(&rich, &cheap, Some(2)), Ordering::Less);
        assert_eq!(compare_by_effective_price(&cheap, &rich, Some(2)), Ordering::Greater);

        // Same effective price, higher cap wins.
        let low_cap = signed_1559(0, 3, 8, 100_000);
        let high_cap = signed_1559(0, 3, 20, 100_000);
        assert_eq!(
            compare_by_effective_price(&high_cap, &low_cap, Some(2)),
            Ordering::Less
        );
        assert_eq!(
            compare_by_effective_price(&high_cap, &high_cap, Some(2)),
            Ordering::Equal
        );
    }

    #[test]
    fn pre_1559_ordering_uses_raw_gas_price() {
        let slow = signed_legacy(0, 5);
        let fast = signed_legacy(0, 9);
        assert_eq!(compare_by_effective_price(&fast, &slow, None), Ordering::Less);
    }

    #[test]
    fn base_fee_affordability_checks() {
        assert!(validate_against_base_fee(&signed_legacy(0, 10), 10).is_ok());
        assert!(matches!(
            validate_against_base_fee(&signed_legacy(0, 9), 10),
            Err(MempoolError::GasPriceBelowBaseFee)
        ));
        assert!(validate_against_base_fee(&signed_1559(0, 1, 10, 100_000), 10).is_ok());
        assert!(matches!(
            validate_against_base_fee(&signed_1559(0, 1, 9, 100_000), 10),
            Err(MempoolError::InsufficientMaxFeePerGas)
        ));
    }
}
