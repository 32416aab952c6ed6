//! Remote address matching against CIDR ranges.
//!
//! Network and broadcast addresses count as members of a range, so
//! `10.0.0.0/24` admits both `10.0.0.0` and `10.0.0.255`.

use ipnet::IpNet;
use std::net::IpAddr;

use crate::error::AuthenticationError;

/// Returns true if `address` lies inside `cidr`.
///
/// An unparseable range or address never matches; the parse failure is
/// logged rather than returned.
#[must_use]
pub fn is_in_range(address: &str, cidr: &str) -> bool {
    let range = match cidr.trim().parse::<IpNet>() {
        Ok(range) => range,
        Err(e) => {
            tracing::warn!(range = cidr, error = %e, "invalid CIDR range");
            return false;
        }
    };

    let Some(address) = parse_address(address) else {
        tracing::warn!(remote_addr = address, "invalid remote address");
        return false;
    };

    range.contains(&address)
}

/// Fails with `AccessDenied` unless `address` matches at least one range.
///
/// Stops at the first matching range. An empty range set denies.
pub fn check_access<'a, I>(address: &str, user: &str, ranges: I) -> Result<(), AuthenticationError>
where
    I: IntoIterator<Item = &'a str>,
{
    if ranges.into_iter().any(|range| is_in_range(address, range)) {
        return Ok(());
    }

    tracing::warn!(user, remote_addr = address, "login is not allowed from this address");
    Err(AuthenticationError::AccessDenied {
        user: user.to_string(),
        address: address.to_string(),
    })
}

/// Splits a comma-separated list of ranges, dropping blank entries.
pub fn split_ranges(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_address(address: &str) -> Option<IpAddr> {
    match address.trim().parse::<IpAddr>().ok()? {
        // Dual-stack listeners report IPv4 peers as mapped IPv6.
        IpAddr::V6(v6) => Some(v6.to_ipv4_mapped().map_or(IpAddr::V6(v6), IpAddr::V4)),
        v4 => Some(v4),
    }
}
