use std::sync::Arc;

use crate::config::HostConfig;

use super::{
	args::{Domain, ForwardPath, ReversePath},
	command::ParseCommandError,
	Command, Envelope, Response, ResponseCode,
};

/// What a piece of client input produced: either a reply to write straight
/// back, or a complete envelope. The caller owns the decision on a received
/// envelope and must write the final reply itself; until it does, the
/// transaction is unanswered.
pub enum Event {
	Reply(Response),
	Received(Envelope),
}

/// The receiving half of an SMTP session, one per connection. Strings go in
/// through [`Server::push`], replies and completed envelopes come out; no
/// networking in here.
pub struct Server {
	config: Arc<dyn HostConfig>,
	state: State,
	command: String,
	envelope: Envelope,
}

impl Server {
	pub fn initiate(config: Arc<dyn HostConfig>) -> (Self, Response) {
		let primary_host = config.primary_host();
		(
			Self {
				config,
				state: State::default(),
				command: String::new(),
				envelope: Envelope::new(),
			},
			Response::with_message(
				ResponseCode::ServiceReady,
				format!("{} (mailgate) ready", primary_host),
			),
		)
	}

	pub fn push(&mut self, line: &str) -> Option<Event> {
		self.command.push_str(line);

		// Return early if it's not a line
		if !self.command.ends_with("\r\n") {
			return None;
		}

		if self.state == State::LoadingData {
			self.loading_data()
		} else {
			let resp = self.run_command();
			self.command.clear();

			Some(Event::Reply(resp))
		}
	}

	pub fn should_exit(&self) -> bool {
		self.state == State::Exit
	}

	fn loading_data(&mut self) -> Option<Event> {
		// An empty message is just the terminator
		if self.command == ".\r\n" || self.command.ends_with("\r\n.\r\n") {
			self.envelope.raw_data(&self.command);
			self.command.clear();

			// Data is complete; the envelope is the caller's problem now
			let envelope = std::mem::take(&mut self.envelope);
			self.state = State::Greeted;

			Some(Event::Received(envelope))
		} else {
			None
		}
	}

	fn run_command(&mut self) -> Response {
		let command = self.command.trim_end().parse();

		match command {
			Ok(command) => match command {
				Command::Helo(client_domain) => self.helo(&client_domain),
				Command::Ehlo(client_domain) => self.ehlo(&client_domain),
				Command::Mail(reverse_path) => self.mail(reverse_path),
				Command::Rcpt(forward_path) => self.rcpt(forward_path),
				Command::Data => self.data(),
				Command::Rset => self.rset(),
				Command::Vrfy(_) => Response::with_message(
					ResponseCode::CannotVrfyUser,
					"cannot VRFY user, but will attempt delivery",
				),
				Command::Expn(_) => Self::not_implemented(),
				Command::Help(_) => {
					Response::with_message(ResponseCode::HelpMessage, "Please review RFC 5321")
				}
				Command::Noop => Response::with_message(ResponseCode::Okay, "Okay"),
				Command::Quit => self.quit(),
			},
			Err(err) => match err {
				ParseCommandError::InvalidCommand => Self::syntax_error(),
				ParseCommandError::InvalidPath(_) => {
					Response::with_message(ResponseCode::InvalidParameters, "Bad path")
				}
				ParseCommandError::InvalidDomain(err) => Response::with_message(
					ResponseCode::InvalidParameters,
					format!("Bad domain: {}", err),
				),
			},
		}
	}

	fn helo(&mut self, client_domain: &Domain) -> Response {
		// 4.1.4 does not say the same thing about HELO, so we check the state
		match self.state {
			State::Initiated => {
				self.state = State::Greeted;

				Response::with_message(
					ResponseCode::Okay,
					format!(
						"{} (mailgate) greets {}",
						self.config.primary_host(),
						client_domain
					),
				)
			}
			_ => Self::bad_command(),
		}
	}

	fn ehlo(&mut self, client_domain: &Domain) -> Response {
		// Section 4.1.4 allows EHLO to appear later in the session, resetting
		// state and buffers as RSET would
		self.rset();
		self.state = State::Greeted;

		let mut resp = Response::with_message(
			ResponseCode::Okay,
			format!(
				"{} (mailgate) greets {}",
				self.config.primary_host(),
				client_domain
			),
		);
		resp.push("HELP");
		resp
	}

	fn mail(&mut self, reverse_path: ReversePath) -> Response {
		if self.state == State::Greeted {
			self.state = State::GotReversePath;
			self.envelope.reverse_path = reverse_path;

			Response::with_message(ResponseCode::Okay, "Okay")
		} else {
			Self::bad_command()
		}
	}

	fn rcpt(&mut self, forward_path: ForwardPath) -> Response {
		if self.state == State::GotReversePath || self.state == State::GotForwardPath {
			match &forward_path {
				ForwardPath::Postmaster => self.add_rcpt(forward_path),
				ForwardPath::Regular(address) => {
					if self.config.accepts_recipient(address) {
						self.add_rcpt(forward_path)
					} else {
						Response::with_message(
							ResponseCode::MailboxUnavailable,
							"mailbox unavailable",
						)
					}
				}
			}
		} else {
			Self::bad_command()
		}
	}

	fn add_rcpt(&mut self, forward_path: ForwardPath) -> Response {
		self.state = State::GotForwardPath;
		self.envelope.forward_paths.push(forward_path);

		Response::with_message(ResponseCode::Okay, "Okay")
	}

	fn data(&mut self) -> Response {
		if self.state == State::GotForwardPath {
			self.state = State::LoadingData;
			Response::with_message(ResponseCode::StartMailInput, "Start mail input")
		} else {
			Self::bad_command()
		}
	}

	fn rset(&mut self) -> Response {
		self.envelope.clear();

		self.state = match self.state {
			State::Initiated => State::Initiated,
			_ => State::Greeted,
		};

		Response::with_message(ResponseCode::Okay, "Okay")
	}

	fn quit(&mut self) -> Response {
		self.state = State::Exit;

		Response::with_message(
			ResponseCode::ServiceClosing,
			format!("{} Goodbye", self.config.primary_host()),
		)
	}

	fn not_implemented() -> Response {
		Response::with_message(
			ResponseCode::CommandNotImplemented,
			"Command not implemented",
		)
	}

	fn bad_command() -> Response {
		Response::with_message(ResponseCode::BadCommandSequence, "bad sequence of commands")
	}

	fn syntax_error() -> Response {
		Response::with_message(ResponseCode::UnrecognizedCommand, "Syntax Error")
	}
}

#[derive(Default, PartialEq)]
enum State {
	#[default]
	Initiated,
	Greeted,
	GotReversePath,
	GotForwardPath,
	LoadingData,
	Exit,
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::smtp::args::Address;

	struct TestHost;

	impl HostConfig for TestHost {
		fn primary_host(&self) -> Domain {
			"gate.example.com".parse().unwrap()
		}

		fn accepts_recipient(&self, address: &Address) -> bool {
			address.domain == self.primary_host()
		}
	}

	fn server() -> Server {
		let (server, greeting) = Server::initiate(Arc::new(TestHost));
		assert_eq!(greeting.code(), ResponseCode::ServiceReady);

		server
	}

	fn greeted_server() -> Server {
		let mut server = server();
		let reply = reply(&mut server, "HELO client.example.com\r\n");
		assert_eq!(reply.code(), ResponseCode::Okay);

		server
	}

	fn reply(server: &mut Server, line: &str) -> Response {
		match server.push(line) {
			Some(Event::Reply(response)) => response,
			Some(Event::Received(_)) => panic!("expected a reply, got an envelope"),
			None => panic!("expected a reply, got nothing"),
		}
	}

	#[test]
	fn mail_before_greeting_is_rejected() {
		let mut server = server();
		let reply = reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");

		assert_eq!(reply.code(), ResponseCode::BadCommandSequence);
	}

	#[test]
	fn data_requires_a_recipient() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		let reply = reply(&mut server, "DATA\r\n");

		assert_eq!(reply.code(), ResponseCode::BadCommandSequence);
	}

	#[test]
	fn foreign_recipient_is_rejected() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		let reply = reply(&mut server, "RCPT TO:<someone@elsewhere.example.com>\r\n");

		assert_eq!(reply.code(), ResponseCode::MailboxUnavailable);
	}

	#[test]
	fn postmaster_is_always_accepted() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		let reply = reply(&mut server, "RCPT TO:<postmaster>\r\n");

		assert_eq!(reply.code(), ResponseCode::Okay);
	}

	#[test]
	fn complete_transaction_yields_envelope() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		reply(&mut server, "RCPT TO:<gate@gate.example.com>\r\n");

		let reply = reply(&mut server, "DATA\r\n");
		assert_eq!(reply.code(), ResponseCode::StartMailInput);

		let envelope = match server.push("hello there\r\n.\r\n") {
			Some(Event::Received(envelope)) => envelope,
			_ => panic!("expected the completed envelope"),
		};

		assert_eq!(envelope.sender(), "friend@example.com");
		assert_eq!(envelope.data, "hello there\r\n");
	}

	#[test]
	fn data_accumulates_until_terminated() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		reply(&mut server, "RCPT TO:<gate@gate.example.com>\r\n");
		reply(&mut server, "DATA\r\n");

		assert!(server.push("line1\r\n").is_none());
		assert!(server.push("line2\r\n").is_none());

		let envelope = match server.push(".\r\n") {
			Some(Event::Received(envelope)) => envelope,
			_ => panic!("expected the completed envelope"),
		};

		assert_eq!(envelope.data, "line1\r\nline2\r\n");
	}

	#[test]
	fn transaction_can_follow_a_received_envelope() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		reply(&mut server, "RCPT TO:<gate@gate.example.com>\r\n");
		reply(&mut server, "DATA\r\n");
		assert!(matches!(
			server.push("first\r\n.\r\n"),
			Some(Event::Received(_))
		));

		// The session is back in its greeted state; a second message works
		let okay = reply(&mut server, "MAIL FROM:<coworker@example.com>\r\n");
		assert_eq!(okay.code(), ResponseCode::Okay);
	}

	#[test]
	fn rset_clears_the_transaction() {
		let mut server = greeted_server();
		reply(&mut server, "MAIL FROM:<friend@example.com>\r\n");
		reply(&mut server, "RSET\r\n");
		let reply = reply(&mut server, "RCPT TO:<gate@gate.example.com>\r\n");

		assert_eq!(reply.code(), ResponseCode::BadCommandSequence);
	}

	#[test]
	fn quit_exits() {
		let mut server = greeted_server();
		let reply = reply(&mut server, "QUIT\r\n");

		assert_eq!(reply.code(), ResponseCode::ServiceClosing);
		assert!(server.should_exit());
	}

	#[test]
	fn garbage_is_a_syntax_error() {
		let mut server = greeted_server();
		let reply = reply(&mut server, "HLEO whoops\r\n");

		assert_eq!(reply.code(), ResponseCode::UnrecognizedCommand);
	}
}
