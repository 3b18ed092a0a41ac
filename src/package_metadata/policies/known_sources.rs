/// Advisory databases whose exports are accepted
const KNOWN_ADVISORY_SOURCES: &[&str] = &["glad", "trivy-db"];

/// KnownSources policy - allow-list of advisory sources
///
/// Advisories from any other source are rejected during fabrication,
/// so a new upstream database has to be added here before it is ingested.
pub struct KnownSources;

impl KnownSources {
    /// Returns true if advisories from `source_xid` may be ingested
    pub fn is_supported(source_xid: &str) -> bool {
        KNOWN_ADVISORY_SOURCES.contains(&source_xid)
    }

    pub fn all() -> &'static [&'static str] {
        KNOWN_ADVISORY_SOURCES
    }
}
