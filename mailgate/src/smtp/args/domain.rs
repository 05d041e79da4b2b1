use std::{
	fmt::{Display, Formatter},
	net::{AddrParseError, IpAddr},
	str::FromStr,
};

use thiserror::Error;

use super::Validator;

/// A Domain as defined by RFC 5321. Either a fully-qualified domain name or
/// an IP address literal.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Domain {
	FQDN(String),
	Literal(IpAddr),
}

impl Display for Domain {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::FQDN(domain) => write!(f, "{}", domain),
			Self::Literal(IpAddr::V4(ip)) => write!(f, "[{}]", ip),
			Self::Literal(IpAddr::V6(ip)) => write!(f, "[IPv6:{}]", ip),
		}
	}
}

impl FromStr for Domain {
	type Err = ParseDomainError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if Validator::validate_domain(s) {
			Ok(Self::FQDN(s.into()))
		} else if let Some(stripped) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
			let ip = if let Some(ipv6_literal) = stripped.strip_prefix("IPv6:") {
				// Only parse ipv6 if it claims to be one
				IpAddr::V6(ipv6_literal.parse()?)
			} else {
				IpAddr::V4(stripped.parse()?)
			};

			Ok(Self::Literal(ip))
		} else {
			Err(ParseDomainError::InvalidDomain)
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseDomainError {
	#[error("failed to parse address literal")]
	AddrParseError(#[from] AddrParseError),
	#[error("invalid domain or address")]
	InvalidDomain,
}
