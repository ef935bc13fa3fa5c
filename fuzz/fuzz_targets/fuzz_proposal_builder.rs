// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for proposal sanitization and year normalization

#![no_main]

use assetcheck_audit::{build_proposal, ProposalDraft, ProposalLimits, SubmittedEvidence};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(Value::Object(edits)) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let draft = ProposalDraft {
        asset_id: Some("A-1".to_string()),
        auditor_remark: None,
        edits,
    };

    // Building must never panic, and nothing blank may survive it.
    if let Ok(payload) = build_proposal(draft, SubmittedEvidence::default(), &ProposalLimits::default()) {
        for (_, value) in payload.proposed_changes.as_map() {
            assert!(!value.is_null());
            assert_ne!(value.as_str(), Some(""));
        }
        if let Some(year) = payload.proposed_changes.get("year") {
            assert!(year.is_i64() || year.is_u64());
        }
    }
});
