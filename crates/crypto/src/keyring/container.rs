//! In-memory collection of keyrings keyed by address

use std::collections::HashMap;

use alloy_primitives::{Address, B256};
use tracing::debug;

use super::error::{KeyringError, KeyringResult};
use super::Keyring;
use crate::encoding::address_to_hex;
use crate::message::MessageSigned;
use crate::role::RoleGroup;
use crate::signature::SignatureData;

/// Keyrings indexed by address, one per address.
#[derive(Debug, Clone, Default)]
pub struct KeyringContainer {
    keyrings: HashMap<Address, Keyring>,
}

impl KeyringContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Container seeded with `keyrings`. Duplicate addresses are rejected.
    pub fn with_keyrings(keyrings: impl IntoIterator<Item = Keyring>) -> KeyringResult<Self> {
        let mut container = Self::new();
        for keyring in keyrings {
            container.add(keyring)?;
        }
        Ok(container)
    }

    /// Generate `count` single-key keyrings and return their addresses.
    pub fn generate(&mut self, count: usize, entropy: Option<&[u8]>) -> KeyringResult<Vec<Address>> {
        let mut addresses = Vec::with_capacity(count);
        for _ in 0..count {
            let keyring = Keyring::generate(entropy)?;
            addresses.push(keyring.address());
            self.add(keyring)?;
        }
        Ok(addresses)
    }

    pub fn len(&self) -> usize {
        self.keyrings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyrings.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keyrings.contains_key(address)
    }

    /// Add a keyring, failing if its address is already taken.
    pub fn add(&mut self, keyring: Keyring) -> KeyringResult<&Keyring> {
        let address = keyring.address();
        if self.keyrings.contains_key(&address) {
            return Err(KeyringError::DuplicateKeyring(address_to_hex(&address)));
        }
        debug!(address = %address_to_hex(&address), kind = %keyring.kind(), "Added keyring");
        Ok(self.keyrings.entry(address).or_insert(keyring))
    }

    pub fn get(&self, address: &Address) -> KeyringResult<&Keyring> {
        self.keyrings
            .get(address)
            .ok_or_else(|| KeyringError::KeyringNotFound(address_to_hex(address)))
    }

    /// Replace the keyring stored under the same address.
    pub fn update(&mut self, keyring: Keyring) -> KeyringResult<()> {
        let slot = self
            .keyrings
            .get_mut(&keyring.address())
            .ok_or_else(|| KeyringError::KeyringNotFound(keyring.address_hex()))?;
        debug!(address = %keyring.address_hex(), "Updated keyring");
        *slot = keyring;
        Ok(())
    }

    /// Remove a keyring; returns whether one was stored.
    pub fn remove(&mut self, address: &Address) -> bool {
        let removed = self.keyrings.remove(address).is_some();
        if removed {
            debug!(address = %address_to_hex(address), "Removed keyring");
        }
        removed
    }

    /// Addresses in ascending order.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.keyrings.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Sign a transaction hash with the keyring stored for `address`.
    pub fn sign(
        &self,
        address: &Address,
        hash: &B256,
        chain_id: u64,
        role: RoleGroup,
    ) -> KeyringResult<Vec<SignatureData>> {
        self.get(address)?.sign(hash, chain_id, role)
    }

    /// Sign a transaction hash with one key of the stored keyring.
    pub fn sign_at(
        &self,
        address: &Address,
        hash: &B256,
        chain_id: u64,
        role: RoleGroup,
        index: i64,
    ) -> KeyringResult<SignatureData> {
        self.get(address)?.sign_at(hash, chain_id, role, index)
    }

    /// Sign a prefixed message with the keyring stored for `address`.
    pub fn sign_prefixed_message(
        &self,
        address: &Address,
        message: &str,
        role: RoleGroup,
    ) -> KeyringResult<MessageSigned> {
        self.get(address)?.sign_prefixed_message(message, role)
    }

    /// Sign a prefixed message with one key of the stored keyring.
    pub fn sign_prefixed_message_at(
        &self,
        address: &Address,
        message: &str,
        role: RoleGroup,
        index: i64,
    ) -> KeyringResult<MessageSigned> {
        self.get(address)?
            .sign_prefixed_message_at(message, role, index)
    }
}
