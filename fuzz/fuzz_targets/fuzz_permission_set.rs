// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for permission list ingest

#![no_main]

use assetcheck_access::{normalize, Action, PermissionSet, RawPermission};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Stored sets load through the lenient normalizer
    if let Ok(set) = serde_json::from_slice::<PermissionSet>(data) {
        assert_eq!(set.iter().count(), Action::COUNT);

        let raw: Vec<RawPermission> = set.iter().map(Into::into).collect();
        assert_eq!(normalize(&raw), set);
        assert_eq!(PermissionSet::from_raw_strict(&raw).ok(), Some(set));
    }
});
