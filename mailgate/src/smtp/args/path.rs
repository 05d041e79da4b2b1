use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use thiserror::Error;

use super::{Address, ParseAddressError};

/// The sender argument of MAIL. Null is the bounce address, `<>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReversePath {
	#[default]
	Null,
	Regular(Address),
}

impl ReversePath {
	/// The bare string the policy checks against the allow list. The null
	/// path has no mailbox; it yields the empty string, which can never be
	/// a member.
	pub fn sender(&self) -> String {
		match self {
			Self::Null => String::new(),
			Self::Regular(address) => address.to_string(),
		}
	}
}

impl Display for ReversePath {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Null => write!(f, "<>"),
			Self::Regular(address) => write!(f, "<{}>", address),
		}
	}
}

impl FromStr for ReversePath {
	type Err = ParsePathError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == "<>" {
			Ok(Self::Null)
		} else {
			Ok(Self::Regular(parse_bracketed(s)?))
		}
	}
}

/// The recipient argument of RCPT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForwardPath {
	Postmaster,
	Regular(Address),
}

impl Display for ForwardPath {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Postmaster => write!(f, "<postmaster>"),
			Self::Regular(address) => write!(f, "<{}>", address),
		}
	}
}

impl FromStr for ForwardPath {
	type Err = ParsePathError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.eq_ignore_ascii_case("<postmaster>") {
			Ok(Self::Postmaster)
		} else {
			Ok(Self::Regular(parse_bracketed(s)?))
		}
	}
}

fn parse_bracketed(s: &str) -> Result<Address, ParsePathError> {
	let naked = s
		.strip_prefix('<')
		.and_then(|s| s.strip_suffix('>'))
		.ok_or(ParsePathError::Brackets)?;

	Ok(naked.parse()?)
}

#[derive(Error, Debug)]
pub enum ParsePathError {
	#[error("no enclosing angle brackets")]
	Brackets,
	#[error("invalid address")]
	InvalidAddress(#[from] ParseAddressError),
}
