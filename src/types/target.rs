//! Target specification types with CIDR and hostname support.
//!
//! A target argument may be a single IP address, a CIDR block
//! (`192.168.1.0/24`) or a hostname. CIDR blocks expand to their host
//! addresses; hostnames are resolved over DNS.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A single scan target resolved to an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname, IP, or CIDR string).
    pub original: String,
    /// The resolved IP address.
    pub ip: IpAddr,
}

impl ScanTarget {
    /// Create a new scan target.
    pub fn new(original: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            original: original.into(),
            ip,
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.original, self.ip)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target: {0}")]
    InvalidFormat(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("CIDR range too large: {0} addresses (max: {1})")]
    CidrTooLarge(u128, u128),
}

/// A parsed target argument, prior to resolution.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A CIDR network range.
    Cidr(IpNetwork),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Maximum number of hosts allowed in a CIDR range (a /16 for IPv4).
    pub const MAX_CIDR_HOSTS: u128 = 65536;

    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;

            let host_count = cidr_size(&network);
            if host_count > Self::MAX_CIDR_HOSTS {
                return Err(TargetError::CidrTooLarge(host_count, Self::MAX_CIDR_HOSTS));
            }

            return Ok(Self::Cidr(network));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Resolve this target specification to a list of scan targets.
    ///
    /// CIDR ranges expand to all host addresses (network and broadcast
    /// addresses excluded for IPv4); hostnames resolve to their first
    /// address.
    pub async fn resolve(&self) -> Result<Vec<ScanTarget>, TargetError> {
        match self {
            Self::Single(ip) => Ok(vec![ScanTarget::new(ip.to_string(), *ip)]),

            Self::Cidr(network) => {
                let original = network.to_string();
                let targets: Vec<ScanTarget> = network
                    .iter()
                    .filter(|ip| is_host_address(network, ip))
                    .map(|ip| ScanTarget::new(original.clone(), ip))
                    .collect();
                Ok(targets)
            }

            Self::Hostname(hostname) => {
                let resolver =
                    TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

                let response = resolver.lookup_ip(hostname.as_str()).await.map_err(|e| {
                    TargetError::DnsResolutionFailed(hostname.clone(), e.to_string())
                })?;

                match response.iter().next() {
                    Some(ip) => Ok(vec![ScanTarget::new(hostname.clone(), ip)]),
                    None => Err(TargetError::NoAddressesFound(hostname.clone())),
                }
            }
        }
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

fn cidr_size(network: &IpNetwork) -> u128 {
    match network {
        IpNetwork::V4(net) => net.size() as u128,
        IpNetwork::V6(net) => {
            let prefix = net.prefix() as u32;
            if prefix >= 128 {
                1
            } else {
                1u128 << (128 - prefix)
            }
        }
    }
}

/// Exclude the IPv4 network and broadcast addresses from expansion.
fn is_host_address(network: &IpNetwork, ip: &IpAddr) -> bool {
    if let (IpNetwork::V4(net), IpAddr::V4(addr)) = (network, ip) {
        if net.prefix() < 31 {
            return *addr != net.network() && *addr != net.broadcast();
        }
    }
    true
}

/// Check if a string is a plausible hostname (RFC 1123 labels).
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}
