// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registers the reference configurators under their short names
//!. Called once at process startup, from `ens-cli`.

use std::sync::Arc;

use ens_engine::Registry;

use crate::cluster::ClusterConfigurator;
use crate::dns::DnsConfigurator;
use crate::file_writer::FileWriterConfigurator;
use crate::shell::ShellConfigurator;

pub fn register_all(registry: &mut Registry) {
    registry.register("shell", || Arc::new(ShellConfigurator::new()));
    registry.register("file", || Arc::new(FileWriterConfigurator::new()));
    registry.register("dns", || Arc::new(DnsConfigurator::new()));
    registry.register("cluster", || Arc::new(ClusterConfigurator::new()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_four_reference_configurators() {
        let mut registry = Registry::new();
        register_all(&mut registry);
        for name in ["shell", "file", "dns", "cluster"] {
            assert!(registry.is_registered(name), "{name} not registered");
        }
    }
}
