use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use thiserror::Error;

use super::{Domain, ParseDomainError, Validator};

/// The part of an address before the @.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct LocalPart(String);

impl Display for LocalPart {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for LocalPart {
	type Err = InvalidLocalPart;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if Validator::validate_local_part(s) {
			Ok(Self(s.to_owned()))
		} else {
			Err(InvalidLocalPart)
		}
	}
}

#[derive(Error, Debug)]
#[error("invalid local part syntax")]
pub struct InvalidLocalPart;

/// A bare mailbox address, `local@domain`. This is the form senders take on
/// an allow list and the form the forward destination is configured in;
/// bracket handling belongs to the path types.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Address {
	pub local_part: LocalPart,
	pub domain: Domain,
}

impl Address {
	pub fn new(local_part: LocalPart, domain: Domain) -> Self {
		Self { local_part, domain }
	}
}

impl Display for Address {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}@{}", self.local_part, self.domain)
	}
}

impl FromStr for Address {
	type Err = ParseAddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// The local part may contain a quoted @, so split on the last one
		if let Some((local_part, domain)) = s.rsplit_once('@') {
			Ok(Self {
				local_part: local_part.parse()?,
				domain: domain.parse()?,
			})
		} else {
			Err(ParseAddressError::NoAtSign)
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseAddressError {
	#[error("no @")]
	NoAtSign,
	#[error("invalid local part")]
	InvalidLocalPart(#[from] InvalidLocalPart),
	#[error("invalid domain")]
	InvalidDomain(#[from] ParseDomainError),
}
