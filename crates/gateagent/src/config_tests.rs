// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = r#"
[application]
name = gatecontrol-agent
instance = 1
shutdownTimeout = 10
printTimeout = 5
influxURL = http://influx.example/write

[terminal]
location = DEHAM
loadingplace = 12

[gate]
name = gate-1
purpose = entry
command = /usr/local/bin/open-gate.sh

[rabbitmq]
url = nats://broker.example:4222

[scanner scanner-1]
driver = keyboard
path = /dev/input/event0
prefix = SCAN
"#;

fn sample_ini() -> Ini {
    Ini::load_from_str(SAMPLE).unwrap()
}

#[test]
fn parses_all_sections() {
    let config = Config::from_ini(&sample_ini()).unwrap();
    assert_eq!(config.application.name, "gatecontrol-agent");
    assert_eq!(config.application.instance, 1);
    assert_eq!(config.application.shutdown_timeout, Duration::from_secs(10));
    assert_eq!(config.terminal.location, "DEHAM");
    assert_eq!(config.terminal.loading_place, 12);
    assert_eq!(config.gate.purpose, GatePurpose::Entry);
    assert_eq!(config.rabbitmq.url, "nats://broker.example:4222");
    assert_eq!(config.scanners.len(), 1);
    assert_eq!(config.scanners[0].driver, "keyboard");
}

#[test]
fn reentry_timeout_defaults_to_five_minutes() {
    let config = Config::from_ini(&sample_ini()).unwrap();
    assert_eq!(config.gate.reentry_timeout, Duration::from_secs(5 * 60));
}

#[test]
fn reentry_timeout_is_overridable() {
    let with_override = SAMPLE.replacen(
        "command = /usr/local/bin/open-gate.sh",
        "command = /usr/local/bin/open-gate.sh\nreEntryTimeout = 2",
        1,
    );
    let ini = Ini::load_from_str(&with_override).unwrap();
    let config = Config::from_ini(&ini).unwrap();
    assert_eq!(config.gate.reentry_timeout, Duration::from_secs(2 * 60));
}

#[test]
fn missing_required_key_is_fatal() {
    let broken = SAMPLE.replace("name = gatecontrol-agent\n", "");
    let ini = Ini::load_from_str(&broken).unwrap();
    let err = Config::from_ini(&ini).unwrap_err();
    assert!(matches!(err, GateAgentError::ConfigInvalid(_)));
}

#[test]
fn invalid_purpose_is_fatal() {
    let broken = SAMPLE.replace("purpose = entry", "purpose = north");
    let ini = Ini::load_from_str(&broken).unwrap();
    assert!(Config::from_ini(&ini).is_err());
}
