//! Splits a bonding or unbonding amount across registry nodes.
//!
//! Both directions run in two phases. Phase one corrects imbalance: bonding
//! fills under-allocated nodes in proportion to their deficit, unbonding
//! drains over-allocated nodes in proportion to their excess. Whatever phase
//! one did not place (including its rounding loss) flows in phase two by raw
//! weight when bonding, or by remaining stake when unbonding. Floor division
//! leaves a remainder that the caller carries into the next batch.

use crate::error::CustomErrorCode;
use crate::math::{checked_add, checked_sub, mul_div};
use crate::network::StakingNetwork;
use crate::state::{Node, NodeRegistry};
use anchor_lang::prelude::*;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Imbalances {
    pub total_over: u64,
    pub total_under: u64,
    pub over: Vec<u64>,
    pub under: Vec<u64>,
}

/// Per node distance from `target_total * weight / total_weight`.
pub fn imbalances(nodes: &[Node], total_weight: u64, target_total: u64) -> Result<Imbalances> {
    let mut result = Imbalances {
        over: vec![0; nodes.len()],
        under: vec![0; nodes.len()],
        ..Default::default()
    };
    for (i, node) in nodes.iter().enumerate() {
        let optimal = mul_div(target_total, node.weight, total_weight)?;
        if node.staked > optimal {
            result.over[i] = node.staked - optimal;
            result.total_over = checked_add(result.total_over, result.over[i])?;
        } else if optimal > node.staked {
            result.under[i] = optimal - node.staked;
            result.total_under = checked_add(result.total_under, result.under[i])?;
        }
    }
    Ok(result)
}

/// Stakes up to `requested` and returns the amount actually placed.
pub fn bond<N: StakingNetwork>(
    registry: &mut NodeRegistry,
    target_total: u64,
    requested: u64,
    network: &mut N,
) -> Result<u64> {
    require!(registry.total_weight > 0, CustomErrorCode::NoActiveWeight);
    let imbalance = imbalances(&registry.nodes, registry.total_weight, target_total)?;

    let mut amounts = vec![0u64; registry.nodes.len()];
    let mut placed = 0u64;

    let phase_one = requested.min(imbalance.total_under);
    if phase_one > 0 {
        for (amount, under) in amounts.iter_mut().zip(&imbalance.under) {
            *amount = mul_div(phase_one, *under, imbalance.total_under)?;
            placed = checked_add(placed, *amount)?;
        }
    }

    let phase_two = checked_sub(requested, placed)?;
    if phase_two > 0 {
        for (amount, node) in amounts.iter_mut().zip(&registry.nodes) {
            let share = mul_div(phase_two, node.weight, registry.total_weight)?;
            *amount = checked_add(*amount, share)?;
            placed = checked_add(placed, share)?;
        }
    }

    for (node, amount) in registry.nodes.iter_mut().zip(amounts) {
        if amount == 0 {
            continue;
        }
        network.stake(&node.id, amount)?;
        node.staked = checked_add(node.staked, amount)?;
    }
    Ok(placed)
}

/// Unstakes up to `requested`, one withdraw slot per touched node, and
/// returns the amount actually pulled.
pub fn unbond<N: StakingNetwork>(
    registry: &mut NodeRegistry,
    target_total: u64,
    requested: u64,
    network: &mut N,
) -> Result<u64> {
    let imbalance = imbalances(&registry.nodes, registry.total_weight, target_total)?;

    let mut amounts = vec![0u64; registry.nodes.len()];
    let mut pulled = 0u64;

    let phase_one = requested.min(imbalance.total_over);
    if phase_one > 0 {
        for (amount, over) in amounts.iter_mut().zip(&imbalance.over) {
            *amount = mul_div(phase_one, *over, imbalance.total_over)?;
            pulled = checked_add(pulled, *amount)?;
        }
    }

    // Denominator and numerators both come from the post phase one amounts.
    let remaining: Vec<u64> = registry
        .nodes
        .iter()
        .zip(&amounts)
        .map(|(node, amount)| checked_sub(node.staked, *amount))
        .collect::<Result<_>>()?;
    let total_remaining = remaining
        .iter()
        .try_fold(0u64, |total, stake| checked_add(total, *stake))?;

    let phase_two = checked_sub(requested, pulled)?.min(total_remaining);
    if phase_two > 0 {
        for (amount, stake) in amounts.iter_mut().zip(&remaining) {
            let share = mul_div(phase_two, *stake, total_remaining)?;
            *amount = checked_add(*amount, share)?;
            pulled = checked_add(pulled, share)?;
        }
    }

    for (node, amount) in registry.nodes.iter_mut().zip(amounts) {
        if amount == 0 {
            continue;
        }
        let slot = node.withdrawals.allocate()?;
        network.unstake(&node.id, amount, slot)?;
        node.staked = checked_sub(node.staked, amount)?;
    }
    Ok(pulled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{error_code, MockNetwork};
    use crate::registry::WeightDelta;

    fn weighted(weights: &[u64]) -> NodeRegistry {
        let mut registry = NodeRegistry::default();
        for weight in weights {
            let id = Pubkey::new_unique();
            registry.add_node(id).unwrap();
            registry
                .update_weights(&[WeightDelta {
                    node: id,
                    amount: *weight,
                    increase: true,
                }])
                .unwrap();
        }
        registry
    }

    fn staked(registry: &NodeRegistry) -> Vec<u64> {
        registry.nodes.iter().map(|node| node.staked).collect()
    }

    #[test]
    fn imbalances_split_over_and_under() {
        let mut registry = weighted(&[50, 50, 0]);
        registry.nodes[0].staked = 70;
        registry.nodes[1].staked = 20;
        registry.nodes[2].staked = 10;
        let result = imbalances(&registry.nodes, registry.total_weight, 100).unwrap();
        assert_eq!(result.over, vec![20, 0, 10]);
        assert_eq!(result.under, vec![0, 30, 0]);
        assert_eq!(result.total_over, 30);
        assert_eq!(result.total_under, 30);
    }

    #[test]
    fn imbalances_without_weight_are_all_over() {
        let mut registry = weighted(&[0, 0]);
        registry.nodes[0].staked = 4;
        let result = imbalances(&registry.nodes, 0, 100).unwrap();
        assert_eq!(result.total_over, 4);
        assert_eq!(result.total_under, 0);
    }

    #[test]
    fn bond_splits_by_weight_from_empty() {
        let mut registry = weighted(&[60, 40]);
        let mut network = MockNetwork::default();
        assert_eq!(bond(&mut registry, 10, 10, &mut network).unwrap(), 10);
        assert_eq!(staked(&registry), vec![6, 4]);
        assert_eq!(network.stakes.len(), 2);
    }

    #[test]
    fn bond_fills_deficit_before_weight() {
        let mut registry = weighted(&[50, 50]);
        registry.nodes[0].staked = 60;
        registry.nodes[1].staked = 20;
        let mut network = MockNetwork::default();

        // target 100: deficit of 30 on the second node only
        assert_eq!(bond(&mut registry, 100, 20, &mut network).unwrap(), 20);
        assert_eq!(staked(&registry), vec![60, 40]);
        assert_eq!(network.stakes, vec![(registry.nodes[1].id, 20)]);
    }

    #[test]
    fn bond_remainder_flows_by_weight() {
        let mut registry = weighted(&[50, 50]);
        registry.nodes[1].staked = 10;
        let mut network = MockNetwork::default();

        // target 30: optimal 15 each, deficits 15 and 5, then 10 by weight
        assert_eq!(bond(&mut registry, 30, 30, &mut network).unwrap(), 30);
        assert_eq!(staked(&registry), vec![20, 20]);
    }

    #[test]
    fn bond_dust_is_below_active_node_count() {
        let mut registry = weighted(&[1, 1, 1, 0]);
        let mut network = MockNetwork::default();
        let placed = bond(&mut registry, 100, 100, &mut network).unwrap();
        assert_eq!(placed, 99);
        assert!(100 - placed < 3);
        assert_eq!(registry.nodes[3].staked, 0);
        assert_eq!(network.stakes.len(), 3);
    }

    #[test]
    fn bond_skips_zero_amounts() {
        let mut registry = weighted(&[1, 1000]);
        let mut network = MockNetwork::default();
        assert_eq!(bond(&mut registry, 5, 5, &mut network).unwrap(), 4);
        assert_eq!(network.stakes, vec![(registry.nodes[1].id, 4)]);
    }

    #[test]
    fn bond_without_weight_fails() {
        let mut registry = weighted(&[0]);
        let mut network = MockNetwork::default();
        assert_eq!(
            error_code(bond(&mut registry, 10, 10, &mut network).unwrap_err()),
            error_code(CustomErrorCode::NoActiveWeight.into())
        );
        assert!(network.stakes.is_empty());
    }

    #[test]
    fn unbond_drains_excess_first() {
        let mut registry = weighted(&[50, 50]);
        registry.nodes[0].staked = 70;
        registry.nodes[1].staked = 50;
        let mut network = MockNetwork::default();

        // target 100: node zero holds 20 too many
        assert_eq!(unbond(&mut registry, 100, 20, &mut network).unwrap(), 20);
        assert_eq!(staked(&registry), vec![50, 50]);
        assert_eq!(network.unstakes, vec![(registry.nodes[0].id, 20, 0)]);
        assert_eq!(registry.nodes[0].withdrawals.size, 1);
        assert_eq!(registry.nodes[1].withdrawals.size, 0);
    }

    #[test]
    fn unbond_remainder_follows_remaining_stake() {
        let mut registry = weighted(&[50, 50, 0]);
        registry.nodes[0].staked = 40;
        registry.nodes[1].staked = 40;
        registry.nodes[2].staked = 20;
        let mut network = MockNetwork::default();

        // target 60: optimal 30 each, excess 10 + 10 + 20 = 40, then 20 more
        // drawn from 30/30/0 remaining
        assert_eq!(unbond(&mut registry, 60, 60, &mut network).unwrap(), 60);
        assert_eq!(staked(&registry), vec![20, 20, 0]);
    }

    #[test]
    fn unbond_caps_at_available_stake() {
        let mut registry = weighted(&[1, 1]);
        registry.nodes[0].staked = 5;
        registry.nodes[1].staked = 5;
        let mut network = MockNetwork::default();
        assert_eq!(unbond(&mut registry, 0, 25, &mut network).unwrap(), 10);
        assert_eq!(staked(&registry), vec![0, 0]);
    }

    #[test]
    fn unbond_fails_when_slots_are_exhausted() {
        let mut registry = weighted(&[1]);
        registry.nodes[0].staked = 10;
        for _ in 0..crate::state::WITHDRAW_SLOT_CAPACITY {
            registry.nodes[0].withdrawals.allocate().unwrap();
        }
        let mut network = MockNetwork::default();
        assert_eq!(
            error_code(unbond(&mut registry, 5, 5, &mut network).unwrap_err()),
            error_code(CustomErrorCode::WithdrawSlotsFull.into())
        );
    }

    #[test]
    fn failed_network_call_propagates() {
        let mut registry = weighted(&[1, 1]);
        let mut network = MockNetwork {
            fail_stake: true,
            ..Default::default()
        };
        assert_eq!(
            error_code(bond(&mut registry, 10, 10, &mut network).unwrap_err()),
            error_code(CustomErrorCode::NetworkCallFailed.into())
        );
    }

    #[test]
    fn failed_unstake_propagates() {
        let mut registry = weighted(&[1, 1]);
        registry.nodes[0].staked = 10;
        registry.nodes[1].staked = 10;
        let mut network = MockNetwork {
            fail_unstake: true,
            ..Default::default()
        };
        assert_eq!(
            error_code(unbond(&mut registry, 10, 10, &mut network).unwrap_err()),
            error_code(CustomErrorCode::NetworkCallFailed.into())
        );
        assert!(network.unstakes.is_empty());
    }
}
