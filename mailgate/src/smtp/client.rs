use std::fmt::{Display, Formatter};

use thiserror::Error;

use super::{
	args::{Address, Domain, ForwardPath},
	Command, Envelope, ParseResponseError, Response, ResponseCode,
};

/// The sending half of an SMTP session: drives one envelope to one
/// destination mailbox. Server replies go in through [`Client::push`],
/// commands to put on the wire come out. Anything the destination server
/// refuses comes back as a [`ClientError`]; there is no bounce handling in
/// here, failure is the caller's to surface.
pub struct Client {
	state: State,
	reply: String,
	hello: Domain,
	destination: Address,
	envelope: Envelope,
}

impl Client {
	pub fn initiate(hello: Domain, destination: Address, envelope: Envelope) -> Self {
		Self {
			state: State::Initiated,
			reply: String::new(),
			hello,
			destination,
			envelope,
		}
	}

	pub fn push(&mut self, reply: &str) -> Result<Option<Output>, ClientError> {
		self.reply.push_str(reply);

		// Return early if it's not a line
		if !self.reply.ends_with("\r\n") {
			return Ok(None);
		}

		// ... or if it's a multiline reply that hasn't finished
		if let Some(line) = self.reply.trim_end().split("\r\n").last() {
			if line.len() >= 4 && line.as_bytes()[3] == b'-' {
				return Ok(None);
			}
		}

		let response: Response = self.reply.parse()?;
		self.reply.clear();

		self.process_reply(response)
	}

	pub fn should_exit(&self) -> bool {
		self.state == State::ShouldExit
	}

	fn process_reply(&mut self, response: Response) -> Result<Option<Output>, ClientError> {
		let code = response.code();

		// We MUST only exit once the server has replied to our quit. The RFC
		// says that reply MUST be a 221, but we're leaving either way.
		if self.state == State::SentQuit {
			self.state = State::ShouldExit;
			return Ok(None);
		}

		if code.is_negative() {
			return Err(ClientError::Refused {
				code: code.as_code(),
				message: response.text(),
			});
		}

		let output = match self.state {
			State::Initiated => {
				Self::expect(code, ResponseCode::ServiceReady)?;
				self.state = State::Greeted;

				Output::Command(Command::Helo(self.hello.clone()))
			}
			State::Greeted => {
				Self::expect(code, ResponseCode::Okay)?;
				self.state = State::SentReversePath;

				Output::Command(Command::Mail(self.envelope.reverse_path.clone()))
			}
			State::SentReversePath => {
				Self::expect(code, ResponseCode::Okay)?;
				self.state = State::SentForwardPath;

				Output::Command(Command::Rcpt(ForwardPath::Regular(
					self.destination.clone(),
				)))
			}
			State::SentForwardPath => {
				Self::expect(code, ResponseCode::Okay)?;
				self.state = State::SentData;

				Output::Command(Command::Data)
			}
			State::SentData => {
				Self::expect(code, ResponseCode::StartMailInput)?;
				self.state = State::SentPayload;

				Output::Data(stuffed(&self.envelope.data))
			}
			State::SentPayload => {
				Self::expect(code, ResponseCode::Okay)?;
				self.state = State::SentQuit;

				Output::Command(Command::Quit)
			}
			// handled above
			State::SentQuit | State::ShouldExit => return Ok(None),
		};

		Ok(Some(output))
	}

	fn expect(got: ResponseCode, want: ResponseCode) -> Result<(), ClientError> {
		if got == want {
			Ok(())
		} else {
			Err(ClientError::UnexpectedReply {
				code: got.as_code(),
				expected: want.as_code(),
			})
		}
	}
}

#[derive(Clone, Copy, PartialEq)]
enum State {
	Initiated,
	Greeted,
	SentReversePath,
	SentForwardPath,
	SentData,
	SentPayload,
	SentQuit,
	ShouldExit,
}

#[derive(Debug)]
pub enum Output {
	Command(Command),
	Data(String),
}

impl Display for Output {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Command(command) => write!(f, "{}\r\n", command),
			Self::Data(data) if data.ends_with("\r\n") => write!(f, "{}.\r\n", data),
			Self::Data(data) => write!(f, "{}\r\n.\r\n", data),
		}
	}
}

/// Reintroduce the dot transparency the ingress stripped, so a payload line
/// of "." can't end our DATA section early.
fn stuffed(data: &str) -> String {
	data.split_inclusive("\r\n")
		.map(|line| {
			if line.starts_with('.') {
				format!(".{}", line)
			} else {
				line.to_string()
			}
		})
		.collect()
}

#[derive(Error, Debug)]
pub enum ClientError {
	#[error("the server refused delivery with {code}: {message}")]
	Refused { code: u16, message: String },
	#[error("expected a {expected} reply, got {code}")]
	UnexpectedReply { code: u16, expected: u16 },
	#[error("the server sent a reply we couldn't parse")]
	BadReply(#[from] ParseResponseError),
}
