//! Address-based policy boundaries: admin verification and the DoS-guard
//! whitelist probe.

use std::collections::HashSet;

/// Decides whether a client address gets admin privileges for a call.
///
/// Selected at construction time so deployments can swap the policy without
/// touching dispatch: an address allowlist for private setups, a hard "no"
/// for public ones, or something transport-specific implemented outside this
/// crate.
pub trait AdminVerifier: Send + Sync {
    fn is_admin(&self, client_ip: &str) -> bool;
}

/// Grants admin to an explicit set of source addresses.
pub struct IpAdminVerifier {
    allowed: HashSet<String>,
}

impl IpAdminVerifier {
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// The conventional private-deployment policy: loopback is admin.
    #[must_use]
    pub fn localhost() -> Self {
        Self::new(["127.0.0.1".to_string(), "::1".to_string()])
    }
}

impl AdminVerifier for IpAdminVerifier {
    fn is_admin(&self, client_ip: &str) -> bool {
        self.allowed.contains(client_ip)
    }
}

/// Denies admin unconditionally.
pub struct NeverAdminVerifier;

impl AdminVerifier for NeverAdminVerifier {
    fn is_admin(&self, _client_ip: &str) -> bool {
        false
    }
}

/// Admission-control probe consumed by the engine when posting work: a
/// whitelisted address is exempt from queue-depth limits.
pub trait DosGuard: Send + Sync {
    fn is_whitelisted(&self, client_ip: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_verifier_matches_exact_addresses() {
        let verifier = IpAdminVerifier::new(["10.0.0.5".to_string()]);
        assert!(verifier.is_admin("10.0.0.5"));
        assert!(!verifier.is_admin("10.0.0.6"));
    }

    #[test]
    fn localhost_policy_covers_both_loopbacks() {
        let verifier = IpAdminVerifier::localhost();
        assert!(verifier.is_admin("127.0.0.1"));
        assert!(verifier.is_admin("::1"));
        assert!(!verifier.is_admin("192.168.0.1"));
    }

    #[test]
    fn never_verifier_always_denies() {
        assert!(!NeverAdminVerifier.is_admin("127.0.0.1"));
    }
}
