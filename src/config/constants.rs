//! Configuration constants.
//!
//! Defaults for partitioning, rankings and concurrency.

/// Ids covered by the first part of a url-id partitioned stream
pub const DEFAULT_FIRST_PART_SIZE: u64 = 500_000;
/// Ids covered by every following part
pub const DEFAULT_PART_SIZE: u64 = 500_000;

/// Number of domains kept by each top-domain ranking (typical value: 100)
pub const DEFAULT_NB_TOP_DOMAINS: usize = 100;

/// Partition jobs run at the same time by the counter task
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

// Artifact names
pub const TOP_FULL_DOMAINS_FILE: &str = "top_full_domains.json";
pub const TOP_SECOND_LEVEL_DOMAINS_FILE: &str = "top_second_level_domains.json";
