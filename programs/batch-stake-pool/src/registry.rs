use crate::error::CustomErrorCode;
use crate::math::{checked_add, checked_sub};
use crate::state::{Node, NodeRegistry, MAX_NODES};
use anchor_lang::prelude::*;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightDelta {
    pub node: Pubkey,
    pub amount: u64,
    pub increase: bool,
}

impl NodeRegistry {
    pub fn position(&self, id: &Pubkey) -> Option<usize> {
        match self.index.get(id) {
            Some(&slot) if slot > 0 => Some(slot as usize - 1),
            _ => None,
        }
    }

    pub fn contains(&self, id: &Pubkey) -> bool {
        self.position(id).is_some()
    }

    pub fn node(&self, id: &Pubkey) -> Result<&Node> {
        let position = self.position(id).ok_or(CustomErrorCode::NodeNotFound)?;
        Ok(&self.nodes[position])
    }

    pub fn node_mut(&mut self, id: &Pubkey) -> Result<&mut Node> {
        let position = self.position(id).ok_or(CustomErrorCode::NodeNotFound)?;
        Ok(&mut self.nodes[position])
    }

    /// Snapshot in storage order, which removals reshuffle.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    pub fn node_ids(&self) -> Vec<Pubkey> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    pub fn total_staked(&self) -> Result<u64> {
        self.nodes
            .iter()
            .try_fold(0u64, |total, node| checked_add(total, node.staked))
    }

    pub fn add_node(&mut self, id: Pubkey) -> Result<()> {
        require!(!self.contains(&id), CustomErrorCode::NodeAlreadyExists);
        require!(self.nodes.len() < MAX_NODES, CustomErrorCode::TooManyNodes);
        self.nodes.push(Node::new(id));
        self.index.insert(id, self.nodes.len() as u8);
        Ok(())
    }

    /// Increases fail for unknown or disabled nodes. Decreases clamp at zero
    /// and skip unknown nodes.
    pub fn update_weights(&mut self, deltas: &[WeightDelta]) -> Result<()> {
        for delta in deltas {
            if delta.increase {
                let node = self.node_mut(&delta.node)?;
                require!(!node.disabled, CustomErrorCode::NodeDisabled);
                node.weight = checked_add(node.weight, delta.amount)?;
                self.total_weight = checked_add(self.total_weight, delta.amount)?;
            } else {
                let Some(position) = self.position(&delta.node) else {
                    continue;
                };
                let node = &mut self.nodes[position];
                let removed = delta.amount.min(node.weight);
                if removed == 0 {
                    continue;
                }
                node.weight -= removed;
                self.total_weight = checked_sub(self.total_weight, removed)?;
            }
        }
        Ok(())
    }

    pub fn disable_node(&mut self, id: &Pubkey) -> Result<()> {
        let node = self.node_mut(id)?;
        require!(!node.disabled, CustomErrorCode::NodeDisabled);
        let weight = node.weight;
        node.weight = 0;
        node.disabled = true;
        self.total_weight = checked_sub(self.total_weight, weight)?;
        Ok(())
    }

    /// Swap-and-pop removal; the moved node's index entry is rewritten.
    pub fn remove_node(&mut self, id: &Pubkey) -> Result<Node> {
        let position = self.position(id).ok_or(CustomErrorCode::NodeNotFound)?;
        let node = &self.nodes[position];
        require!(
            node.weight == 0 && node.staked == 0,
            CustomErrorCode::NodeStillActive
        );
        require!(
            !node.has_pending_withdrawals(),
            CustomErrorCode::PendingWithdrawals
        );

        let removed = self.nodes.swap_remove(position);
        self.index.remove(id);
        if let Some(moved) = self.nodes.get(position) {
            self.index.insert(moved.id, position as u8 + 1);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::error_code;

    fn increase(node: Pubkey, amount: u64) -> WeightDelta {
        WeightDelta {
            node,
            amount,
            increase: true,
        }
    }

    fn decrease(node: Pubkey, amount: u64) -> WeightDelta {
        WeightDelta {
            node,
            amount,
            increase: false,
        }
    }

    fn registry_with(count: usize) -> (NodeRegistry, Vec<Pubkey>) {
        let mut registry = NodeRegistry::default();
        let ids: Vec<Pubkey> = (0..count).map(|_| Pubkey::new_unique()).collect();
        for id in &ids {
            registry.add_node(*id).unwrap();
        }
        (registry, ids)
    }

    #[test]
    fn add_rejects_duplicates_and_overflow() {
        let (mut registry, ids) = registry_with(MAX_NODES);
        assert_eq!(
            error_code(registry.add_node(ids[0]).unwrap_err()),
            error_code(CustomErrorCode::NodeAlreadyExists.into())
        );
        assert_eq!(
            error_code(registry.add_node(Pubkey::new_unique()).unwrap_err()),
            error_code(CustomErrorCode::TooManyNodes.into())
        );
        assert_eq!(registry.node(&ids[3]).unwrap().weight, 0);
    }

    #[test]
    fn weights_track_total_incrementally() {
        let (mut registry, ids) = registry_with(2);
        registry
            .update_weights(&[increase(ids[0], 60), increase(ids[1], 40)])
            .unwrap();
        assert_eq!(registry.total_weight, 100);

        registry
            .update_weights(&[decrease(ids[0], 100), decrease(Pubkey::new_unique(), 5)])
            .unwrap();
        assert_eq!(registry.node(&ids[0]).unwrap().weight, 0);
        assert_eq!(registry.total_weight, 40);

        // already zero, silently skipped
        registry.update_weights(&[decrease(ids[0], 1)]).unwrap();
        assert_eq!(registry.total_weight, 40);

        assert_eq!(
            error_code(registry.update_weights(&[increase(Pubkey::new_unique(), 1)]).unwrap_err()),
            error_code(CustomErrorCode::NodeNotFound.into())
        );
    }

    #[test]
    fn disabled_node_cannot_regain_weight() {
        let (mut registry, ids) = registry_with(2);
        registry
            .update_weights(&[increase(ids[0], 30), increase(ids[1], 70)])
            .unwrap();
        registry.disable_node(&ids[1]).unwrap();
        assert_eq!(registry.total_weight, 30);
        assert!(registry.node(&ids[1]).unwrap().disabled);

        assert_eq!(
            error_code(registry.update_weights(&[increase(ids[1], 1)]).unwrap_err()),
            error_code(CustomErrorCode::NodeDisabled.into())
        );
        assert_eq!(
            error_code(registry.disable_node(&ids[1]).unwrap_err()),
            error_code(CustomErrorCode::NodeDisabled.into())
        );
    }

    #[test]
    fn remove_swaps_last_into_place() {
        let (mut registry, ids) = registry_with(3);
        let removed = registry.remove_node(&ids[0]).unwrap();
        assert_eq!(removed.id, ids[0]);
        assert_eq!(registry.node_ids(), vec![ids[2], ids[1]]);
        assert_eq!(registry.position(&ids[2]), Some(0));
        assert_eq!(registry.position(&ids[1]), Some(1));
        assert!(!registry.contains(&ids[0]));

        // removing the tail leaves the others untouched
        registry.remove_node(&ids[1]).unwrap();
        assert_eq!(registry.node_ids(), vec![ids[2]]);
        assert_eq!(registry.position(&ids[2]), Some(0));
    }

    #[test]
    fn remove_requires_idle_node() {
        let (mut registry, ids) = registry_with(1);
        registry.update_weights(&[increase(ids[0], 1)]).unwrap();
        assert_eq!(
            error_code(registry.remove_node(&ids[0]).unwrap_err()),
            error_code(CustomErrorCode::NodeStillActive.into())
        );

        registry.update_weights(&[decrease(ids[0], 1)]).unwrap();
        registry.node_mut(&ids[0]).unwrap().withdrawals.allocate().unwrap();
        assert_eq!(
            error_code(registry.remove_node(&ids[0]).unwrap_err()),
            error_code(CustomErrorCode::PendingWithdrawals.into())
        );

        let node = registry.node_mut(&ids[0]).unwrap();
        node.withdrawals = Default::default();
        node.forced_pending = true;
        assert!(registry.remove_node(&ids[0]).is_err());

        registry.node_mut(&ids[0]).unwrap().forced_pending = false;
        registry.remove_node(&ids[0]).unwrap();
        assert!(registry.nodes().is_empty());
    }
}
