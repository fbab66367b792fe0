//! Link-graph aggregations.
//!
//! - [`bad_links`]: links pointing at erroring pages, and their counts per
//!   source page and status code
//! - [`top_domains`]: most linked external domains

pub mod bad_links;
pub mod top_domains;

pub use bad_links::{get_bad_link_counters, get_bad_links, BadLinkCounters, BadLinks};
pub use top_domains::{
    analyze, compute_top_full_domains, compute_top_second_level_domains,
    filter_external_outlinks, filter_invalid_destination_urls, resolve_sample_url_id,
    DomainCounter, TopDomains,
};
