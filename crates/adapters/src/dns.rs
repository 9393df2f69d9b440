// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DNS record sync configurator: reconciles a zone's records against
//! `inputs.records` over an RFC 2136 dynamic update, mirroring the
//! `configure`/`delete`/`check` split of the original OctoDNS-backed
//! configurator (`unfurl/configurators/octodns.py`) but targeting a plain
//! nameserver instead of a provider-plugin framework.

use std::net::SocketAddr;
use std::str::FromStr;

use async_trait::async_trait;
use ens_core::Status;
use ens_engine::{Configurator, ConfiguratorResult, RuntimeError, Step, StepResume, Task};
use hickory_client::client::{AsyncClient, ClientHandle};
use hickory_client::rr::rdata::{A, AAAA, CNAME, TXT};
use hickory_client::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_client::udp::UdpClientStream;
use serde::Deserialize;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::inputs::require_str;

#[derive(Debug, Deserialize)]
struct RecordInput {
    #[serde(rename = "type")]
    record_type: String,
    value: String,
    #[serde(default = "default_ttl")]
    ttl: u32,
}

fn default_ttl() -> u32 {
    300
}

/// Registry short name `"dns"`.
pub struct DnsConfigurator;

impl DnsConfigurator {
    pub fn new() -> Self {
        Self
    }

    async fn connect(&self, nameserver: &str) -> Result<AsyncClient, Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = nameserver.parse()?;
        let stream = UdpClientStream::<UdpSocket>::new(addr);
        let (client, bg) = AsyncClient::connect(stream).await?;
        tokio::spawn(bg);
        Ok(client)
    }
}

impl Default for DnsConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

fn build_record(zone: &Name, record_name: &str, input: &RecordInput) -> Result<Record, String> {
    let fqdn = if record_name.is_empty() || record_name == "@" {
        zone.clone()
    } else {
        Name::parse(record_name, Some(zone)).map_err(|e| e.to_string())?
    };
    let rdata = match input.record_type.to_ascii_uppercase().as_str() {
        "A" => RData::A(A(input.value.parse().map_err(|_| format!("invalid A value {:?}", input.value))?)),
        "AAAA" => RData::AAAA(AAAA(input.value.parse().map_err(|_| format!("invalid AAAA value {:?}", input.value))?)),
        "CNAME" => RData::CNAME(CNAME(Name::from_str(&input.value).map_err(|e| e.to_string())?)),
        "TXT" => RData::TXT(TXT::new(vec![input.value.clone()])),
        other => return Err(format!("unsupported record type {other:?}")),
    };
    Ok(Record::from_rdata(fqdn, input.ttl, rdata))
}

fn fail(task: &Task, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> RuntimeError {
    RuntimeError::ConfiguratorFailed {
        configurator: "dns".to_string(),
        interface: task.interface.clone(),
        operation: task.operation.clone(),
        target: task.target_name.clone(),
        source: source.into(),
    }
}

#[derive(Debug)]
struct AdapterError(String);
impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for AdapterError {}

#[async_trait]
impl Configurator for DnsConfigurator {
    fn can_dry_run(&self, _task: &Task) -> bool {
        true
    }

    fn can_run(&self, task: &Task) -> Result<(), String> {
        if task.inputs.get("name").and_then(|v| v.as_str()).is_none() {
            return Err("missing DNS zone name".to_string());
        }
        if task.inputs.get("nameserver").and_then(|v| v.as_str()).is_none() {
            return Err("missing nameserver address".to_string());
        }
        Ok(())
    }

    async fn render(&self, task: &Task) -> Result<serde_json::Value, RuntimeError> {
        let name = require_str(&task.inputs, "name", "dns", &task.interface, &task.operation, &task.target_name)?;
        let nameserver = require_str(&task.inputs, "nameserver", "dns", &task.interface, &task.operation, &task.target_name)?;
        let exclusive = task.inputs.get("exclusive").and_then(|v| v.as_bool()).unwrap_or(false);
        let records = task.inputs.get("records").cloned().unwrap_or(serde_json::json!({}));
        Ok(serde_json::json!({
            "name": name,
            "nameserver": nameserver,
            "exclusive": exclusive,
            "records": records,
        }))
    }

    async fn run(&self, task: &Task, _resume: Option<StepResume>) -> Result<Step, RuntimeError> {
        let rendered = task.rendered.as_ref().expect("render runs before run");
        let zone_name = rendered["name"].as_str().unwrap_or_default();
        let nameserver = rendered["nameserver"].as_str().unwrap_or_default();
        let exclusive = rendered["exclusive"].as_bool().unwrap_or(false);
        let records: std::collections::HashMap<String, Vec<RecordInput>> =
            serde_json::from_value(rendered["records"].clone()).map_err(|e| fail(task, AdapterError(e.to_string())))?;

        let zone = Name::from_str(zone_name).map_err(|e| fail(task, AdapterError(e.to_string())))?;
        let mut client = self
            .connect(nameserver)
            .await
            .map_err(|e| fail(task, AdapterError(e.to_string())))?;

        match task.operation.as_str() {
            "delete" => {
                for (record_name, inputs) in &records {
                    for input in inputs {
                        let record = build_record(&zone, record_name, input).map_err(|e| fail(task, AdapterError(e)))?;
                        client
                            .delete_rrset(record.clone(), zone.clone())
                            .await
                            .map_err(|e| fail(task, AdapterError(e.to_string())))?;
                    }
                }
                info!(target = %task.target_name, zone = %zone_name, "dns records deleted");
                Ok(Step::Done(ConfiguratorResult {
                    success: true,
                    modified: true,
                    applied: true,
                    ready_state: Status::Ok,
                    config_changed: Some(true),
                    result: Some(serde_json::json!({"msg": "records removed"})),
                    outputs: Default::default(),
                    messages: vec![],
                }))
            }
            "check" => {
                let mut query = client
                    .query(zone.clone(), DNSClass::IN, RecordType::ANY)
                    .await
                    .map_err(|e| fail(task, AdapterError(e.to_string())))?;
                let observed = query.take_answers().len();
                let expected: usize = records.values().map(|v| v.len()).sum();
                let in_sync = observed >= expected;
                if !in_sync {
                    warn!(target = %task.target_name, zone = %zone_name, "dns records out of sync");
                }
                Ok(Step::Done(ConfiguratorResult {
                    success: true,
                    modified: false,
                    applied: false,
                    ready_state: if in_sync { Status::Ok } else { Status::Error },
                    config_changed: Some(false),
                    result: Some(serde_json::json!({"msg": if in_sync { "DNS records in sync" } else { "DNS records out of sync" }})),
                    outputs: Default::default(),
                    messages: vec![],
                }))
            }
            _ => {
                // configure / create: exclusive zones replace the rrset first.
                for (record_name, inputs) in &records {
                    for input in inputs {
                        let record = build_record(&zone, record_name, input).map_err(|e| fail(task, AdapterError(e)))?;
                        if exclusive {
                            let _ = client.delete_rrset(record.clone(), zone.clone()).await;
                        }
                        client
                            .create(record, zone.clone())
                            .await
                            .map_err(|e| fail(task, AdapterError(e.to_string())))?;
                    }
                }
                info!(target = %task.target_name, zone = %zone_name, "dns records synced");
                Ok(Step::Done(ConfiguratorResult {
                    success: true,
                    modified: true,
                    applied: true,
                    ready_state: Status::Ok,
                    config_changed: Some(true),
                    result: Some(serde_json::json!({"msg": "DNS synced"})),
                    outputs: Default::default(),
                    messages: vec![],
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Name {
        Name::from_str("example.com.").unwrap()
    }

    #[test]
    fn build_record_qualifies_relative_names_against_zone() {
        let input = RecordInput { record_type: "A".to_string(), value: "10.0.0.1".to_string(), ttl: 300 };
        let record = build_record(&zone(), "www", &input).unwrap();
        assert_eq!(record.name().to_string(), "www.example.com.");
        assert_eq!(record.ttl(), 300);
    }

    #[test]
    fn build_record_treats_at_sign_as_the_zone_apex() {
        let input = RecordInput { record_type: "TXT".to_string(), value: "v=spf1 -all".to_string(), ttl: 60 };
        let record = build_record(&zone(), "@", &input).unwrap();
        assert_eq!(record.name(), &zone());
    }

    #[test]
    fn build_record_rejects_unsupported_type() {
        let input = RecordInput { record_type: "MX".to_string(), value: "10 mail.example.com.".to_string(), ttl: 300 };
        assert!(build_record(&zone(), "@", &input).is_err());
    }
}
