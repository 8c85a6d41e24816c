// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level CLI flags (clap) plus the INI configuration file they
//! point at (spec §6). INI keys are validated eagerly at startup; a
//! missing or malformed key is a fatal [`GateAgentError::ConfigInvalid`].

use std::path::PathBuf;
use std::time::Duration;

use ini::Ini;

use crate::domain::GatePurpose;
use crate::error::GateAgentError;

const DEFAULT_REENTRY_TIMEOUT_MIN: i64 = 5;

/// CLI flags, matching the original `flag.StringVar`/`flag.BoolVar` surface.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "gateagent")]
pub struct Cli {
    /// Path to the INI configuration file.
    #[arg(long = "config", default_value = "./config.ini")]
    pub config: PathBuf,

    /// Prepend timestamps when logging.
    #[arg(long = "timestamps", default_value_t = false)]
    pub timestamps: bool,
}

#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub name: String,
    pub instance: i32,
    pub shutdown_timeout: Duration,
    pub print_timeout: Duration,
    pub influx_url: String,
}

#[derive(Debug, Clone)]
pub struct TerminalConfig {
    pub location: String,
    pub loading_place: i64,
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub name: String,
    pub purpose: GatePurpose,
    pub command: String,
    pub reentry_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RabbitMqConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub name: String,
    pub driver: String,
    pub path: String,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub application: ApplicationConfig,
    pub terminal: TerminalConfig,
    pub gate: GateConfig,
    pub rabbitmq: RabbitMqConfig,
    pub scanners: Vec<ScannerConfig>,
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Self, GateAgentError> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| GateAgentError::ConfigInvalid(format!("failed to load {}: {e}", path.display())))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, GateAgentError> {
        Ok(Self {
            application: read_application(ini)?,
            terminal: read_terminal(ini)?,
            gate: read_gate(ini)?,
            rabbitmq: read_rabbitmq(ini)?,
            scanners: read_scanners(ini)?,
        })
    }

    pub fn scanner_names(&self) -> Vec<&str> {
        self.scanners.iter().map(|s| s.name.as_str()).collect()
    }
}

fn required<'a>(ini: &'a Ini, section: &str, key: &str) -> Result<&'a str, GateAgentError> {
    ini.section(Some(section))
        .and_then(|props| props.get(key))
        .ok_or_else(|| GateAgentError::ConfigInvalid(format!("expected config option [{section}]{key}")))
}

fn optional<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section)).and_then(|props| props.get(key))
}

fn parse_i64(section: &str, key: &str, value: &str) -> Result<i64, GateAgentError> {
    value
        .parse()
        .map_err(|_| GateAgentError::ConfigInvalid(format!("[{section}]{key} is not an integer: {value}")))
}

fn parse_i32(section: &str, key: &str, value: &str) -> Result<i32, GateAgentError> {
    value
        .parse()
        .map_err(|_| GateAgentError::ConfigInvalid(format!("[{section}]{key} is not an integer: {value}")))
}

fn read_application(ini: &Ini) -> Result<ApplicationConfig, GateAgentError> {
    let name = required(ini, "application", "name")?.to_owned();
    let instance = parse_i32("application", "instance", required(ini, "application", "instance")?)?;
    let shutdown_timeout =
        parse_i64("application", "shutdownTimeout", required(ini, "application", "shutdownTimeout")?)?;
    let print_timeout = parse_i64("application", "printTimeout", required(ini, "application", "printTimeout")?)?;
    let influx_url = required(ini, "application", "influxURL")?.to_owned();

    Ok(ApplicationConfig {
        name,
        instance,
        shutdown_timeout: Duration::from_secs(shutdown_timeout.max(0) as u64),
        print_timeout: Duration::from_secs(print_timeout.max(0) as u64),
        influx_url,
    })
}

fn read_terminal(ini: &Ini) -> Result<TerminalConfig, GateAgentError> {
    let location = required(ini, "terminal", "location")?.to_owned();
    let loading_place = parse_i64("terminal", "loadingplace", required(ini, "terminal", "loadingplace")?)?;
    Ok(TerminalConfig { location, loading_place })
}

fn read_gate(ini: &Ini) -> Result<GateConfig, GateAgentError> {
    let name = required(ini, "gate", "name")?.to_owned();
    let purpose: GatePurpose = required(ini, "gate", "purpose")?.parse()?;
    let command = required(ini, "gate", "command")?.to_owned();

    let reentry_timeout_min = match optional(ini, "gate", "reEntryTimeout") {
        Some(raw) => parse_i64("gate", "reEntryTimeout", raw)?,
        None => DEFAULT_REENTRY_TIMEOUT_MIN,
    };

    Ok(GateConfig {
        name,
        purpose,
        command,
        reentry_timeout: Duration::from_secs((reentry_timeout_min.max(0) as u64) * 60),
    })
}

fn read_rabbitmq(ini: &Ini) -> Result<RabbitMqConfig, GateAgentError> {
    Ok(RabbitMqConfig { url: required(ini, "rabbitmq", "url")?.to_owned() })
}

fn read_scanners(ini: &Ini) -> Result<Vec<ScannerConfig>, GateAgentError> {
    let mut scanners = Vec::new();
    for (section, props) in ini.iter() {
        let Some(section) = section else { continue };
        let Some(name) = section.strip_prefix("scanner ") else { continue };

        let get = |key: &str| -> Result<String, GateAgentError> {
            props
                .get(key)
                .map(str::to_owned)
                .ok_or_else(|| GateAgentError::ConfigInvalid(format!("expected config option [{section}]{key}")))
        };

        scanners.push(ScannerConfig {
            name: name.to_owned(),
            driver: get("driver")?,
            path: get("path")?,
            prefix: get("prefix")?,
        });
    }
    Ok(scanners)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
