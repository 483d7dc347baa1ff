pub mod config;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod logger;
pub mod model;
pub mod resolver;
pub mod source;
pub mod summary;

pub use error::{Error, Result};
pub use model::{PolicyResolution, TenantPolicy, Transaction};
pub use resolver::{resolve_fee_policy, rule_criteria, ResolutionContext, Resolver};

use sha2::{Digest, Sha256};

/// Calculate SHA256 digest
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}
