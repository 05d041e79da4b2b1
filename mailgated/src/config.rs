use std::net::{IpAddr, SocketAddr};

use confindent::Confindent;
use getopts::Options;
use thiserror::Error;

use mailgate::smtp::args::{Address, Domain, ParseAddressError};

pub struct Config {
	pub address: IpAddr,
	pub port: u16,
	pub hostnames: Vec<Domain>,
	pub allow_from: Vec<String>,
	pub destination: Address,
}

#[allow(clippy::or_fun_call)]
impl Config {
	fn print_usage<S: AsRef<str>>(prgm: S, opts: &Options) {
		let brief = format!("Usage: {} [options]", prgm.as_ref());
		println!("{}", opts.usage(&brief));
	}

	pub fn socket_address(&self) -> SocketAddr {
		SocketAddr::new(self.address, self.port)
	}

	pub fn get() -> Option<Self> {
		let args: Vec<String> = std::env::args().collect();

		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optopt(
			"l",
			"listen-address",
			"The IP address mailgated will listen for incoming connections on\nDefault: 127.0.0.1",
			"IP_ADDR",
		);
		opts.optopt(
			"p",
			"port",
			"The port mailgated will listen on\nDefault: 25",
			"PORT",
		);
		opts.optopt(
			"c",
			"config",
			"An alternate location to read the config from\nDefault: /etc/mailgate/mailgate.conf",
			"PATH",
		);

		let matches = match opts.parse(&args[1..]) {
			Ok(m) => m,
			Err(_e) => return None,
		};

		if matches.opt_present("help") {
			Self::print_usage(&args[0], &opts);
			return None;
		}

		let conf_path = matches
			.opt_str("config")
			.unwrap_or("/etc/mailgate/mailgate.conf".into());

		let conf = match Confindent::from_file(conf_path) {
			Ok(c) => c,
			Err(_) => match Confindent::from_file("mailgate.conf") {
				Ok(c) => c,
				Err(err) => {
					eprintln!("failed to parse conf file: {}", err);
					return None;
				}
			},
		};

		// Options specified on the command line take priority. We only take the
		// cli_key and convert to the config key internally so that we can remain
		// consistent.
		let find_value = |cli_key: &str| -> Option<String> {
			let conf_key: String = cli_key
				.split('-')
				.map(|word| {
					let mut c = word.chars();
					match c.next() {
						None => String::new(),
						Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
					}
				})
				.collect();

			matches
				.opt_str(cli_key)
				.or(conf.child_value(conf_key).map(|s| s.into()))
		};

		match Self::build(find_value("listen-address"), find_value("port"), &conf) {
			Ok(config) => Some(config),
			Err(err) => {
				eprintln!("{}", err);
				None
			}
		}
	}

	/// Everything after the CLI has been consulted: defaults, parsing, and
	/// the keys that have no command line counterpart.
	fn build(
		address: Option<String>,
		port: Option<String>,
		conf: &Confindent,
	) -> Result<Self, ConfigError> {
		let address_string = address.unwrap_or("127.0.0.1".into());
		let address = address_string
			.parse()
			.map_err(|_| ConfigError::BadAddress(address_string))?;

		let port_string = port.unwrap_or("25".into());
		let port = port_string
			.parse()
			.map_err(|_| ConfigError::BadPort(port_string))?;

		let hostnames = match conf.child_owned("Hostnames") {
			None => return Err(ConfigError::MissingKey("Hostnames")),
			Some(joined) => Self::parse_domains(&joined)?,
		};

		// An absent AllowFrom is an empty allow list: deny everything.
		let allow_from = conf
			.child_owned("AllowFrom")
			.map(|joined| Self::parse_senders(&joined))
			.unwrap_or_default();

		let destination = match conf.child_owned("ForwardTo") {
			None => return Err(ConfigError::MissingKey("ForwardTo")),
			Some(raw) => raw
				.parse()
				.map_err(|err| ConfigError::BadDestination(raw, err))?,
		};

		Ok(Self {
			address,
			port,
			hostnames,
			allow_from,
			destination,
		})
	}

	fn parse_domains(joined: &str) -> Result<Vec<Domain>, ConfigError> {
		let mut names = vec![];
		for split in joined.split(',') {
			let split = split.trim();
			let domain = split
				.parse()
				.map_err(|_| ConfigError::BadDomain(split.to_owned()))?;

			names.push(domain);
		}

		Ok(names)
	}

	/// Allow-list entries are exact strings, so we keep them as written and
	/// only trim the whitespace around the commas.
	fn parse_senders(joined: &str) -> Vec<String> {
		joined
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_owned)
			.collect()
	}
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("'{0}' not found in config")]
	MissingKey(&'static str),
	#[error("failed to parse '{0}' as an IP address")]
	BadAddress(String),
	#[error("failed to parse '{0}' as a port")]
	BadPort(String),
	#[error("failed to parse '{0}' as a domain")]
	BadDomain(String),
	#[error("failed to parse '{0}' as the forward destination: {1}")]
	BadDestination(String, ParseAddressError),
}

#[cfg(test)]
mod test {
	use super::*;

	fn conf() -> Confindent {
		"Hostnames gate.example.com, mx.example.com\nAllowFrom friend@example.com, coworker@example.com\nForwardTo inbox@corp.example\n"
			.parse()
			.unwrap()
	}

	#[test]
	fn builds_from_conf() {
		let config = Config::build(None, None, &conf()).unwrap();

		assert_eq!(config.address, "127.0.0.1".parse::<IpAddr>().unwrap());
		assert_eq!(config.port, 25);
		assert_eq!(config.hostnames.len(), 2);
		assert_eq!(
			config.allow_from,
			vec!["friend@example.com", "coworker@example.com"]
		);
		assert_eq!(config.destination.to_string(), "inbox@corp.example");
	}

	#[test]
	fn cli_values_win() {
		let config = Config::build(
			Some("10.0.0.1".into()),
			Some("2525".into()),
			&conf(),
		)
		.unwrap();

		assert_eq!(config.address, "10.0.0.1".parse::<IpAddr>().unwrap());
		assert_eq!(config.port, 2525);
	}

	#[test]
	fn missing_hostnames_is_an_error() {
		let conf: Confindent = "ForwardTo inbox@corp.example\n".parse().unwrap();

		assert!(matches!(
			Config::build(None, None, &conf),
			Err(ConfigError::MissingKey("Hostnames"))
		));
	}

	#[test]
	fn missing_forward_to_is_an_error() {
		let conf: Confindent = "Hostnames gate.example.com\n".parse().unwrap();

		assert!(matches!(
			Config::build(None, None, &conf),
			Err(ConfigError::MissingKey("ForwardTo"))
		));
	}

	#[test]
	fn absent_allow_from_is_an_empty_list() {
		let conf: Confindent = "Hostnames gate.example.com\nForwardTo inbox@corp.example\n"
			.parse()
			.unwrap();
		let config = Config::build(None, None, &conf).unwrap();

		assert!(config.allow_from.is_empty());
	}

	#[test]
	fn bad_destination_is_an_error() {
		let conf: Confindent = "Hostnames gate.example.com\nForwardTo not-an-address\n"
			.parse()
			.unwrap();

		assert!(matches!(
			Config::build(None, None, &conf),
			Err(ConfigError::BadDestination(..))
		));
	}

	#[test]
	fn senders_are_kept_as_written() {
		let senders = Config::parse_senders(" Friend@Example.com ,, coworker@example.com");

		// trimmed around the commas, but never case folded
		assert_eq!(senders, vec!["Friend@Example.com", "coworker@example.com"]);
	}

	#[test]
	fn bad_domain_is_an_error() {
		assert!(matches!(
			Config::parse_domains("gate.example.com, -bad-"),
			Err(ConfigError::BadDomain(_))
		));
	}
}
