//! End-to-end test of the dead man's switch lifecycle.
//!
//! 1. Owner funds the wallet and designates an heir
//! 2. Heir proclaims death; an early claim is rejected
//! 3. Owner cancels by acting; heir proclaims again
//! 4. Grace period elapses; heir claims ownership and spends the funds
//! 5. The new owner starts a fresh cycle with a new heir

use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use deadswitch_core::{Address, Amount, Clock, Ledger, ManualClock, MemoryLedger};
use deadswitch_inherit::{
    HeartbeatAction, HeartbeatConfig, SuccessionError, SuccessionEvent, SuccessionPhase, Wallet,
};

fn test_keypair(seed: u8) -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let mut bytes = [0u8; 32];
    bytes[31] = seed;
    bytes[0] = 0x01;
    let sk = SecretKey::from_slice(&bytes).unwrap();
    let pk = sk.public_key(&secp);
    (sk, pk)
}

fn address(seed: u8) -> Address {
    Address::from_public_key(&test_keypair(seed).1)
}

const WALLET: Address = Address::from_bytes([0xEE; 20]);

#[test]
fn test_full_succession_lifecycle() {
    let owner = address(1);
    let heir = address(2);
    let next_heir = address(3);
    let clock = ManualClock::new(1_700_000_000);
    let mut wallet = Wallet::new(WALLET, owner, MemoryLedger::new(), clock.clone());
    let config = HeartbeatConfig::default();

    // 1. Fund and designate
    wallet.receive(&heir, Amount::ONE_BTC).unwrap();
    wallet.set_heir(&owner, heir).unwrap();
    wallet.set_heartbeat_timeout(&owner, 1).unwrap();
    assert_eq!(wallet.balance(), Amount::ONE_BTC);

    // 2. Proclaim, claim too early
    let proclaimed_at = clock.now();
    wallet.proclaim_death(&heir).unwrap();
    assert_eq!(wallet.time_of_death(), proclaimed_at + 1);
    assert_eq!(wallet.status(&config).action, HeartbeatAction::DeathProclaimed);

    let err = wallet.claim_heir_ownership(&heir).unwrap_err();
    assert!(matches!(err, SuccessionError::DeathNotYetEligible { .. }));
    assert_eq!(wallet.owner(), owner);

    // 3. Owner shows up; the proclamation is void
    wallet.heartbeat(&owner).unwrap();
    assert_eq!(wallet.time_of_death(), 0);
    clock.advance(10);
    let err = wallet.claim_heir_ownership(&heir).unwrap_err();
    assert!(matches!(
        err,
        SuccessionError::DeathNotYetEligible {
            claimable_at: 0,
            ..
        }
    ));

    wallet.proclaim_death(&heir).unwrap();

    // 4. Wait out the grace period and claim
    clock.advance(2);
    assert_eq!(wallet.status(&config).action, HeartbeatAction::Claimable);
    let event = wallet.claim_heir_ownership(&heir).unwrap();
    assert_eq!(
        event,
        SuccessionEvent::OwnershipClaimed {
            previous_owner: owner,
            new_owner: heir
        }
    );
    assert_eq!(wallet.owner(), heir);
    assert_eq!(wallet.heir(), None);
    assert_eq!(wallet.time_of_death(), 0);
    assert_eq!(wallet.phase(), SuccessionPhase::Alive);

    // Funds stayed in the wallet; only the new owner may move them
    assert_eq!(wallet.balance(), Amount::ONE_BTC);
    assert!(matches!(
        wallet.send_to(&owner, &owner, Amount::from_sat(1)),
        Err(SuccessionError::Unauthorized { .. })
    ));

    let total = wallet.ledger().total();
    wallet
        .send_to(&heir, &heir, Amount::from_sat(60_000_000))
        .unwrap();
    assert_eq!(wallet.balance(), Amount::from_sat(40_000_000));
    assert_eq!(
        wallet.ledger().balance_of(&heir),
        Amount::from_sat(60_000_000)
    );
    assert_eq!(wallet.ledger().total(), total);

    // 5. Fresh cycle under the new owner
    wallet.set_heir(&heir, next_heir).unwrap();
    assert!(matches!(
        wallet.proclaim_death(&owner),
        Err(SuccessionError::Unauthorized { .. })
    ));
    wallet.proclaim_death(&next_heir).unwrap();
    clock.advance(1);
    wallet.claim_heir_ownership(&next_heir).unwrap();
    assert_eq!(wallet.owner(), next_heir);
}

#[test]
fn test_remove_heir_cancels_in_flight_succession() {
    let owner = address(1);
    let heir = address(2);
    let clock = ManualClock::new(100);
    let mut wallet = Wallet::new(WALLET, owner, MemoryLedger::new(), clock.clone());

    wallet.set_heir(&owner, heir).unwrap();
    wallet.proclaim_death(&heir).unwrap();
    wallet.remove_heir(&owner).unwrap();

    assert_eq!(wallet.heir(), None);
    assert_eq!(wallet.time_of_death(), 0);

    clock.advance(u64::MAX);
    assert!(matches!(
        wallet.claim_heir_ownership(&heir),
        Err(SuccessionError::Unauthorized { .. })
    ));
    assert_eq!(wallet.proclaim_death(&heir), Err(SuccessionError::NoHeirSet));
}

#[test]
fn test_replaced_heir_cannot_claim() {
    let owner = address(1);
    let first = address(2);
    let second = address(3);
    let clock = ManualClock::new(100);
    let mut wallet = Wallet::new(WALLET, owner, MemoryLedger::new(), clock.clone());

    wallet.set_heir(&owner, first).unwrap();
    wallet.proclaim_death(&first).unwrap();
    wallet.set_heir(&owner, second).unwrap();

    clock.advance(1_000_000);
    assert!(matches!(
        wallet.claim_heir_ownership(&first),
        Err(SuccessionError::Unauthorized { .. })
    ));
    // The replacement must proclaim on its own
    assert!(matches!(
        wallet.claim_heir_ownership(&second),
        Err(SuccessionError::DeathNotYetEligible { .. })
    ));
}
