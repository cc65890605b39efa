use crate::foundation::util::encoding::parse_hex_32bytes;
use crate::infrastructure::config::types::{AppConfig, NodeConfig};
use std::collections::HashSet;

impl AppConfig {
    /// Collects every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.run.number == 0 {
            errors.push("run.number must be > 0".to_string());
        }
        if self.run.burst == 0 {
            errors.push("run.burst must be > 0".to_string());
        }
        if !self.run.rate.is_finite() || self.run.rate < 0.0 {
            errors.push(format!("run.rate must be a non-negative number, got {}", self.run.rate));
        }
        if self.run.assembler_workers == 0 {
            errors.push("run.assembler_workers must be > 0".to_string());
        }
        if self.run.integrator_workers == 0 {
            errors.push("run.integrator_workers must be > 0".to_string());
        }

        let committers = self.network.committers.len();
        if self.run.commit_threshold == 0 || self.run.commit_threshold > committers {
            errors.push(format!("run.commit_threshold must be within 1..={}, got {}", committers, self.run.commit_threshold));
        }

        if self.network.channel.trim().is_empty() {
            errors.push("network.channel is required".to_string());
        }
        if self.network.chaincode.trim().is_empty() {
            errors.push("network.chaincode is required".to_string());
        }

        validate_nodes("network.endorsers", &self.network.endorsers, &mut errors);
        validate_nodes("network.committers", &self.network.committers, &mut errors);
        validate_nodes("network.orderers", &self.network.orderers, &mut errors);

        if self.identity.msp_id.trim().is_empty() {
            errors.push("identity.msp_id is required".to_string());
        }
        if let Err(err) = parse_hex_32bytes(&self.identity.signer_seed_hex) {
            errors.push(format!("identity.signer_seed_hex must be 32 bytes of hex: {err}"));
        }

        if self.connection.max_send_message_bytes == 0 || self.connection.max_recv_message_bytes == 0 {
            errors.push("connection message size limits must be > 0".to_string());
        }

        if self.loopback.block_size == 0 {
            errors.push("loopback.block_size must be > 0".to_string());
        }
        if self.loopback.batch_timeout_ms == 0 {
            errors.push("loopback.batch_timeout_ms must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_nodes(section: &str, nodes: &[NodeConfig], errors: &mut Vec<String>) {
    if nodes.is_empty() {
        errors.push(format!("{section} must not be empty"));
        return;
    }
    let mut names = HashSet::new();
    for (idx, node) in nodes.iter().enumerate() {
        if node.name.trim().is_empty() {
            errors.push(format!("{section}[{idx}].name is required"));
        } else if !names.insert(node.name.trim()) {
            errors.push(format!("{section}: duplicate node name '{}'", node.name));
        }
        if node.addr.trim().is_empty() {
            errors.push(format!("{section}[{idx}].addr is required"));
        }
        if let Some(tls) = node.tls.as_ref().filter(|tls| tls.enabled) {
            if tls.ca_certs.is_empty() {
                errors.push(format!("{section}[{idx}].tls.ca_certs is required when tls is enabled"));
            }
            if tls.require_client_cert && (tls.client_cert.is_none() || tls.client_key.is_none()) {
                errors.push(format!("{section}[{idx}].tls.require_client_cert needs client_cert and client_key"));
            }
        }
    }
}
