// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const UUID: &str = "3f1d5f2a-1234-4abc-8def-0123456789ab";

#[test]
fn strips_truckers_trust_prefix() {
    let raw = format!("tt-{UUID}");
    let token = Token::new(&raw, "scanner-1");
    assert_eq!(token.content, UUID);
    assert_eq!(token.provenance, Provenance::TruckersTrust);
}

#[test]
fn paper_has_no_prefix_stripped() {
    let token = Token::new(UUID, "scanner-1");
    assert_eq!(token.content, UUID);
    assert_eq!(token.provenance, Provenance::Paper);
}

#[test]
fn well_formed_requires_uuid_content() {
    assert!(Token::new(UUID, "s").is_well_formed());
    assert!(!Token::new("not-a-uuid", "s").is_well_formed());
    assert!(!Token::new("", "s").is_well_formed());
}
