//! Shared test utilities for deadswitch-inherit tests.

use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use deadswitch_core::Address;

/// Ledger account used as the wallet's own address in tests.
pub const ACCOUNT: Address = Address::from_bytes([0xEE; 20]);

/// Generate a deterministic keypair from a seed byte.
///
/// The secret key is `[0x01, 0x00, ..., 0x00, seed]` (32 bytes).
pub fn test_keypair(seed_byte: u8) -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let mut secret_bytes = [0u8; 32];
    secret_bytes[31] = seed_byte;
    secret_bytes[0] = 0x01;
    let sk = SecretKey::from_slice(&secret_bytes).unwrap();
    let pk = sk.public_key(&secp);
    (sk, pk)
}

/// Address controlled by `test_keypair(seed_byte)`.
pub fn test_address(seed_byte: u8) -> Address {
    Address::from_public_key(&test_keypair(seed_byte).1)
}
