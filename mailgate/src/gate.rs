use async_trait::async_trait;

use crate::{
	policy::{self, AllowList, Verdict},
	smtp::args::Address,
};

/// The reason handed back to the transport when a sender is turned away.
pub const REJECT_REASON: &str = "Address not allowed";

/// The two operations a transport exposes for finishing a message. The gate
/// invokes exactly one of them, exactly once, for every message it screens.
///
/// Errors are the transport's own; the gate passes them through untouched.
#[async_trait]
pub trait DeliveryHandle {
	type Error;

	/// Signal rejection, with a reason, back to the originating transport.
	async fn reject(&mut self, reason: &str) -> Result<(), Self::Error>;

	/// Hand the message to the destination mailbox.
	async fn forward(&mut self, destination: &Address) -> Result<(), Self::Error>;
}

/// The terminal state a screened message reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
	Rejected,
	Forwarded,
}

/// Everything the gate runs on, fixed for the life of the process.
#[derive(Clone, Debug)]
pub struct GateConfig {
	pub allow: AllowList,
	pub destination: Address,
}

/// Screens inbound messages: every message is either rejected with a reason
/// or forwarded to the one configured destination, decided by the sender's
/// allow-list membership.
pub struct Gate {
	config: GateConfig,
}

impl Gate {
	pub fn new(config: GateConfig) -> Self {
		Self { config }
	}

	/// Run one message through the policy and finish it through the handle.
	///
	/// Denied senders are rejected with [`REJECT_REASON`]; allowed senders
	/// are forwarded to the configured destination. A handle failure — the
	/// destination being unreachable, say — comes back untouched. It is not
	/// retried here and it never turns into a rejection.
	pub async fn screen<H>(&self, sender: &str, handle: &mut H) -> Result<Disposition, H::Error>
	where
		H: DeliveryHandle + Send,
	{
		match policy::evaluate(sender, &self.config.allow) {
			Verdict::Denied => {
				handle.reject(REJECT_REASON).await?;

				Ok(Disposition::Rejected)
			}
			Verdict::Allowed => {
				handle.forward(&self.config.destination).await?;

				Ok(Disposition::Forwarded)
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	/// Records which operation the gate invoked instead of doing anything.
	#[derive(Default)]
	struct RecordingHandle {
		rejections: Vec<String>,
		forwards: Vec<String>,
		fail_forward: bool,
	}

	#[async_trait]
	impl DeliveryHandle for RecordingHandle {
		type Error = &'static str;

		async fn reject(&mut self, reason: &str) -> Result<(), Self::Error> {
			self.rejections.push(reason.to_owned());

			Ok(())
		}

		async fn forward(&mut self, destination: &Address) -> Result<(), Self::Error> {
			self.forwards.push(destination.to_string());

			if self.fail_forward {
				Err("mailbox unreachable")
			} else {
				Ok(())
			}
		}
	}

	fn gate() -> Gate {
		Gate::new(GateConfig {
			allow: AllowList::new(["friend@example.com", "coworker@example.com"]),
			destination: "inbox@corp.example".parse().unwrap(),
		})
	}

	#[tokio::test]
	async fn allowed_sender_is_forwarded() {
		let mut handle = RecordingHandle::default();

		let disposition = gate().screen("friend@example.com", &mut handle).await;

		assert_eq!(disposition, Ok(Disposition::Forwarded));
		assert_eq!(handle.forwards, vec!["inbox@corp.example"]);
		assert!(handle.rejections.is_empty());
	}

	#[tokio::test]
	async fn denied_sender_is_rejected_with_the_reason() {
		let mut handle = RecordingHandle::default();

		let disposition = gate().screen("stranger@example.com", &mut handle).await;

		assert_eq!(disposition, Ok(Disposition::Rejected));
		assert_eq!(handle.rejections, vec![REJECT_REASON]);
		assert!(handle.forwards.is_empty());
	}

	#[tokio::test]
	async fn case_mismatch_is_denied() {
		let mut handle = RecordingHandle::default();

		let disposition = gate().screen("Friend@Example.com", &mut handle).await;

		assert_eq!(disposition, Ok(Disposition::Rejected));
	}

	#[tokio::test]
	async fn empty_allow_list_denies_everything() {
		let gate = Gate::new(GateConfig {
			allow: AllowList::default(),
			destination: "inbox@corp.example".parse().unwrap(),
		});
		let mut handle = RecordingHandle::default();

		let disposition = gate.screen("friend@example.com", &mut handle).await;

		assert_eq!(disposition, Ok(Disposition::Rejected));
	}

	#[tokio::test]
	async fn forward_failure_propagates_untouched() {
		let mut handle = RecordingHandle {
			fail_forward: true,
			..Default::default()
		};

		let result = gate().screen("friend@example.com", &mut handle).await;

		assert_eq!(result, Err("mailbox unreachable"));
		// the failure did not turn into a rejection, and nothing was retried
		assert!(handle.rejections.is_empty());
		assert_eq!(handle.forwards.len(), 1);
	}

	#[tokio::test]
	async fn exactly_one_side_effect_per_message() {
		for sender in ["friend@example.com", "stranger@example.com", ""] {
			let mut handle = RecordingHandle::default();
			gate().screen(sender, &mut handle).await.unwrap();

			assert_eq!(
				handle.rejections.len() + handle.forwards.len(),
				1,
				"sender {:?} didn't get exactly one side effect",
				sender
			);
		}
	}
}
