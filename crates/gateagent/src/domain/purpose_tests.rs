// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn round_trips_through_display_and_parse() {
    for p in [GatePurpose::Entry, GatePurpose::Exit] {
        let parsed: GatePurpose = p.to_string().parse().unwrap();
        assert_eq!(parsed, p);
    }
}

#[test]
fn rejects_unknown_purpose() {
    assert!("ENTRY".parse::<GatePurpose>().is_err());
    assert!("".parse::<GatePurpose>().is_err());
}
