//! Clients for the external data sources consulted during an audit
//!
//! Each client wraps one upstream API behind a "fetch metadata" call, applies
//! its own request timeout, and reads/writes the shared [`ResponseCache`].

pub mod github;
pub mod osv;
pub mod provenance;
pub mod registry;

pub use github::{parse_github_url, RepoHostClient};
pub use osv::VulnDbClient;
pub use provenance::ProvenanceClient;
pub use registry::RegistryClient;

pub(crate) const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Percent-encode a package name for use in a URL path, keeping the `@` and
/// `/` of scoped names literal (the registry accepts both forms).
pub(crate) fn encode_package_name(name: &str) -> String {
    urlencoding::encode(name)
        .into_owned()
        .replace("%40", "@")
        .replace("%2F", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_name() {
        assert_eq!(encode_package_name("lodash"), "lodash");
    }

    #[test]
    fn test_encode_scoped_name() {
        assert_eq!(encode_package_name("@babel/core"), "@babel/core");
    }
}
