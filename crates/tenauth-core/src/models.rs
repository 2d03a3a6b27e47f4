//! Domain models for tenauth.
//!
//! These are the core types shared across all crates.

pub mod session;
pub mod tenant;
pub mod user;

/// Trim and ASCII-lowercase a host label, domain or email so that
/// lookups and uniqueness checks are case-insensitive.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_identifier("  Acme.Example.COM "), "acme.example.com");
        assert_eq!(normalize_identifier("Alice@Example.com"), "alice@example.com");
    }
}
