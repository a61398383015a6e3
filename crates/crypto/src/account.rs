//! Public key material handed to account construction
//!
//! A keyring never exposes private keys to account construction. It shapes
//! its public keys role by role into an [`AccountKey`] and attaches a default
//! weighted multisig policy where more than one key signs for a slot.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::role::MAX_KEYS_PER_ROLE;

/// Threshold and per-key weights of a weighted multisig key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeightedMultiSigOptions {
    /// Zero together with no weights marks the empty policy
    pub threshold: u64,
    pub weights: Vec<u64>,
}

impl WeightedMultiSigOptions {
    /// Build a policy, returning `None` when it could never be satisfied.
    pub fn new(threshold: u64, weights: Vec<u64>) -> Option<Self> {
        let options = Self { threshold, weights };
        options.is_valid().then_some(options)
    }

    /// Threshold 1, weight 1 for each of `key_count` keys.
    pub fn default_for(key_count: usize) -> Self {
        Self {
            threshold: 1,
            weights: vec![1; key_count],
        }
    }

    /// Per-role defaults: the empty policy for slots with one key, equal
    /// weights otherwise.
    pub fn default_for_roles(key_counts: &[usize]) -> Vec<Self> {
        key_counts
            .iter()
            .map(|&count| {
                if count == 1 {
                    Self::default()
                } else {
                    Self::default_for(count)
                }
            })
            .collect()
    }

    /// Positive threshold, at most 10 weights, threshold reachable.
    pub fn is_valid(&self) -> bool {
        if self.threshold == 0 || self.weights.len() > MAX_KEYS_PER_ROLE {
            return false;
        }
        let total: u64 = self.weights.iter().sum();
        self.threshold <= total
    }

    pub fn is_empty(&self) -> bool {
        self.threshold == 0 && self.weights.is_empty()
    }
}

/// Key configuration of an account, built from public keys only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountKey {
    /// Slot left unchanged
    Nil,
    /// A single uncompressed public key
    Public { public_key: String },
    /// Several public keys under a threshold policy
    WeightedMultiSig {
        public_keys: Vec<String>,
        options: WeightedMultiSigOptions,
    },
    /// One key per role slot
    RoleBased { roles: Vec<AccountKey> },
}

/// Address plus the key material that controls it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub account_key: AccountKey,
}
