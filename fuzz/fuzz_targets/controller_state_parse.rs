#![no_main]

use deadswitch_inherit::SuccessionController;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Persisted controller state comes from disk. Deserializing arbitrary
    // bytes must never panic, and a state that passes validation must keep
    // the succession invariants through every operation.
    let Ok(mut controller) = serde_json::from_slice::<SuccessionController>(data) else {
        return;
    };
    if controller.validate().is_err() {
        return;
    }

    let owner = controller.owner();
    let now = controller.last_heartbeat().saturating_add(1);

    if let Some(heir) = controller.heir() {
        let _ = controller.proclaim_death(&heir, now);
        assert_ne!(controller.time_of_death(), 0);
        let _ = controller.claim_heir_ownership(&heir, u64::MAX);
    }
    let _ = controller.heartbeat(&owner, now);

    if controller.heir().is_none() {
        assert_eq!(controller.time_of_death(), 0);
    }
    assert!(controller.validate().is_ok());
});
