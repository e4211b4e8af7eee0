#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_layout::{FOUNDATIONAL_TIER_ID, add_custom_tier, normalize, normalize_tiers};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let tiers = normalize(&raw);

    assert_eq!(tiers[0].id.as_str(), FOUNDATIONAL_TIER_ID, "foundation not first");
    assert_eq!(
        tiers.iter().filter(|tier| tier.is_foundational).count(),
        1,
        "foundation flag not unique"
    );
    for (index, tier) in tiers.iter().enumerate() {
        assert_eq!(tier.order as usize, index, "orders not contiguous");
        assert!(!tier.name.is_empty(), "empty tier name");
    }
    let mut ids: Vec<&str> = tiers.iter().map(|tier| tier.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), tiers.len(), "duplicate tier ids");

    assert_eq!(normalize_tiers(&tiers), tiers, "normalization not idempotent");
    let grown = add_custom_tier(&tiers);
    assert_eq!(grown.len(), tiers.len() + 1, "added tier collided");
});
