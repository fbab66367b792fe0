//! Domain extraction from destination URLs.
//!
//! This module extracts the two domain groupings used by top-domain
//! rankings, using the Public Suffix List (PSL) to identify registrable
//! domains:
//! - `extract_full_domain()` - the URL host, e.g. `blog.example.co.uk`
//! - `extract_second_level_domain()` - the registrable domain, e.g. `example.co.uk`

use anyhow::{Context, Result};

/// Parses `url` and returns its lowercased host name.
///
/// # Errors
///
/// Returns an error if the URL cannot be parsed, has no host, or the host is
/// an IP address (IP addresses do not belong to a domain).
pub fn extract_full_domain(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).with_context(|| format!("Failed to parse URL: {}", url))?;

    match parsed.host() {
        Some(url::Host::Domain(host)) => {
            let host = host.trim_end_matches('.').to_ascii_lowercase();
            if host.is_empty() {
                return Err(anyhow::anyhow!("URL '{}' has an empty host", url));
            }
            Ok(host)
        }
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => Err(anyhow::anyhow!(
            "IP addresses do not have domains: {}",
            url
        )),
        None => Err(anyhow::anyhow!("URL '{}' has no host component", url)),
    }
}

/// Returns the registrable domain of a host using the Public Suffix List.
///
/// # Errors
///
/// Returns an error if the host is itself a public suffix (e.g. `co.uk`) or
/// has no known suffix.
pub fn registrable_domain(host: &str) -> Result<String> {
    let domain = psl::domain_str(host)
        .ok_or_else(|| anyhow::anyhow!("No registrable domain found for host: {}", host))?;
    Ok(domain.to_string())
}

/// Extracts the registrable (second-level) domain of a URL.
///
/// # Errors
///
/// Returns an error under the same conditions as [`extract_full_domain`] and
/// [`registrable_domain`].
pub fn extract_second_level_domain(url: &str) -> Result<String> {
    let host = extract_full_domain(url)?;
    registrable_domain(&host)
}
