use mailgate::{
	smtp::args::{Address, Domain},
	HostConfig,
};

/// The daemon's view of itself: the hostnames it answers for. The first
/// configured hostname is the one we introduce ourselves with.
pub struct Host {
	primary: Domain,
	hostnames: Vec<Domain>,
}

impl Host {
	/// None when no hostnames were configured; we need at least one to
	/// greet with.
	pub fn new(hostnames: Vec<Domain>) -> Option<Self> {
		let primary = hostnames.first()?.clone();

		Some(Self {
			primary,
			hostnames,
		})
	}
}

impl HostConfig for Host {
	fn primary_host(&self) -> Domain {
		self.primary.clone()
	}

	fn accepts_recipient(&self, address: &Address) -> bool {
		self.hostnames.contains(&address.domain)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn host() -> Host {
		Host::new(vec![
			"gate.example.com".parse().unwrap(),
			"mx.example.com".parse().unwrap(),
		])
		.unwrap()
	}

	#[test]
	fn needs_at_least_one_hostname() {
		assert!(Host::new(vec![]).is_none());
	}

	#[test]
	fn first_hostname_is_primary() {
		assert_eq!(host().primary_host().to_string(), "gate.example.com");
	}

	#[test]
	fn accepts_recipients_on_own_domains() {
		let host = host();
		let ours: Address = "anyone@mx.example.com".parse().unwrap();
		let foreign: Address = "anyone@elsewhere.example.com".parse().unwrap();

		assert!(host.accepts_recipient(&ours));
		assert!(!host.accepts_recipient(&foreign));
	}
}
