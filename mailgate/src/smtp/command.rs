use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use thiserror::Error;

use super::args::{Domain, ForwardPath, ParseDomainError, ParsePathError, ReversePath};

#[derive(Debug)]
pub enum Command {
	Helo(Domain),
	Ehlo(Domain),
	Mail(ReversePath),
	Rcpt(ForwardPath),
	Data,
	Rset,
	Vrfy(String),
	Expn(String),
	Help(String),
	Noop,
	Quit,
}

impl Display for Command {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Command::Helo(domain) => write!(f, "HELO {}", domain),
			Command::Ehlo(domain) => write!(f, "EHLO {}", domain),
			Command::Mail(reverse_path) => write!(f, "MAIL FROM:{}", reverse_path),
			Command::Rcpt(forward_path) => write!(f, "RCPT TO:{}", forward_path),
			Command::Data => write!(f, "DATA"),
			Command::Rset => write!(f, "RSET"),
			Command::Vrfy(target) => write!(f, "VRFY {}", target),
			Command::Expn(list) => write!(f, "EXPN {}", list),
			Command::Help(topic) => write!(f, "HELP {}", topic),
			Command::Noop => write!(f, "NOOP"),
			Command::Quit => write!(f, "QUIT"),
		}
	}
}

impl FromStr for Command {
	type Err = ParseCommandError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let command = s.split_once(' ').unwrap_or((s, ""));

		match (
			command.0.to_ascii_uppercase().as_str(),
			command.1.trim_end(),
		) {
			("HELO", client_domain) => Ok(Command::Helo(client_domain.parse()?)),
			("EHLO", client_domain) => Ok(Command::Ehlo(client_domain.parse()?)),

			("MAIL", reverse_path) => {
				let reverse_path = reverse_path.split_once(':').unwrap_or(("", ""));
				match (reverse_path.0.to_ascii_uppercase().as_str(), reverse_path.1) {
					("FROM", reverse_path) => Ok(Command::Mail(reverse_path.trim_end().parse()?)),
					_ => Err(ParseCommandError::InvalidCommand),
				}
			}

			("RCPT", forward_path) => {
				let forward_path = forward_path.split_once(':').unwrap_or(("", ""));
				match (forward_path.0.to_ascii_uppercase().as_str(), forward_path.1) {
					("TO", forward_path) => Ok(Command::Rcpt(forward_path.trim_end().parse()?)),
					_ => Err(ParseCommandError::InvalidCommand),
				}
			}

			("DATA", "") => Ok(Command::Data),
			("RSET", "") => Ok(Command::Rset),
			("VRFY", target) => Ok(Command::Vrfy(target.to_owned())),
			("EXPN", list) => Ok(Command::Expn(list.to_owned())),
			("HELP", topic) => Ok(Command::Help(topic.to_owned())),
			("NOOP", _) => Ok(Command::Noop),
			("QUIT", "") => Ok(Command::Quit),
			_ => Err(ParseCommandError::InvalidCommand),
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseCommandError {
	#[error("unknown command")]
	InvalidCommand,
	#[error("invalid path")]
	InvalidPath(#[from] ParsePathError),
	#[error("invalid domain")]
	InvalidDomain(#[from] ParseDomainError),
}
