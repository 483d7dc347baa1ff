//! Read-only access to tenant policy documents.

use crate::error::{Error, Result};
use crate::model::{PolicyDocument, TenantPolicy};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Provides the current policy snapshot for a tenant.
///
/// Implementations hand out whole documents; updating a policy means
/// replacing its document, never editing rules of a snapshot in use.
pub trait PolicySource {
    fn get(&self, tenant_id: &str) -> Result<TenantPolicy>;
}

/// Parse a policy document from JSON.
///
/// Malformed JSON is an `Error::Document`; a well-formed document with a bad
/// rule fails with that rule's configuration error.
pub fn parse_policy(json: &str) -> Result<TenantPolicy> {
    let document: PolicyDocument = serde_json::from_str(json)
        .map_err(|e| Error::Document(format!("Failed to parse policy JSON: {}", e)))?;
    TenantPolicy::try_from(document)
}

pub fn load_policy_file(path: &Path) -> Result<TenantPolicy> {
    let json = fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_policy(&json)
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicySource {
    policies: HashMap<String, TenantPolicy>,
}

impl InMemoryPolicySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace a tenant's policy, returning the previous snapshot.
    pub fn insert(&mut self, policy: TenantPolicy) -> Option<TenantPolicy> {
        self.policies.insert(policy.tenant_id.clone(), policy)
    }
}

impl PolicySource for InMemoryPolicySource {
    fn get(&self, tenant_id: &str) -> Result<TenantPolicy> {
        self.policies
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| Error::PolicyNotFound(tenant_id.to_string()))
    }
}

/// Reads `<dir>/<tenant_id>.json` on every lookup.
#[derive(Debug, Clone)]
pub struct DirectoryPolicySource {
    dir: PathBuf,
}

impl DirectoryPolicySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryPolicySource { dir: dir.into() }
    }

    fn path_for(&self, tenant_id: &str) -> Result<PathBuf> {
        let valid = !tenant_id.is_empty()
            && tenant_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Document(format!("Invalid tenant id '{}'", tenant_id)));
        }
        Ok(self.dir.join(format!("{}.json", tenant_id)))
    }
}

impl PolicySource for DirectoryPolicySource {
    fn get(&self, tenant_id: &str) -> Result<TenantPolicy> {
        let path = self.path_for(tenant_id)?;
        if !path.exists() {
            return Err(Error::PolicyNotFound(tenant_id.to_string()));
        }
        let policy = load_policy_file(&path)?;
        if policy.tenant_id != tenant_id {
            return Err(Error::Document(format!(
                "{} holds policy for tenant {}",
                path.display(),
                policy.tenant_id
            )));
        }
        Ok(policy)
    }
}
