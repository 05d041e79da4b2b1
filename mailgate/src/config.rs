use crate::smtp::args::{Address, Domain};

/// What the ingress server needs to know about the host it fronts.
pub trait HostConfig: Send + Sync {
	/// Returns the hostname that the server will present itself as
	fn primary_host(&self) -> Domain;

	/// Should mail addressed to this mailbox be accepted? This is recipient
	/// admission during RCPT; screening the sender is the gate's job, after
	/// the whole message has arrived.
	fn accepts_recipient(&self, address: &Address) -> bool;
}
