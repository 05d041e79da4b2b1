use std::{num::ParseIntError, str::FromStr};

use thiserror::Error;

#[derive(Debug)]
pub struct Response {
	pub code: ResponseCode,
	messages: Vec<String>,
}

impl Response {
	pub fn new(code: ResponseCode) -> Self {
		Self {
			code,
			messages: vec![],
		}
	}

	pub fn with_message<S: Into<String>>(code: ResponseCode, message: S) -> Self {
		Self {
			code,
			messages: vec![message.into()],
		}
	}

	pub fn push(&mut self, message: &str) {
		self.messages.push(message.to_owned());
	}

	pub fn code(&self) -> ResponseCode {
		self.code
	}

	/// The reply text with the lines joined, for error reporting.
	pub fn text(&self) -> String {
		self.messages.join(" ")
	}

	pub fn as_string(&self) -> String {
		if self.messages.is_empty() {
			return format!("{} \r\n", self.code.as_code());
		}

		let last = self.messages.len() - 1;
		let mut ret = String::new();

		for (index, message) in self.messages.iter().enumerate() {
			let separator = if index == last { ' ' } else { '-' };
			ret.push_str(&format!(
				"{}{}{}\r\n",
				self.code.as_code(),
				separator,
				message
			));
		}

		ret
	}
}

impl FromStr for Response {
	type Err = ParseResponseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.trim().is_empty() {
			return Err(ParseResponseError::EmptyString);
		}

		let lines: Vec<&str> = s.trim_end().split("\r\n").collect();
		let last = lines.len() - 1;
		let mut response: Option<Response> = None;

		for (index, line) in lines.iter().enumerate() {
			if line.len() < 3 {
				return Err(ParseResponseError::MalformedResponse);
			}

			let (digits, rest) = line.split_at(3);
			let code: ResponseCode = digits.parse()?;

			let message = match rest.chars().next() {
				None if index == last => "",
				Some(' ') if index == last => rest[1..].trim(),
				Some('-') if index < last => rest[1..].trim(),
				_ => return Err(ParseResponseError::MalformedResponse),
			};

			match &mut response {
				None => response = Some(Response::with_message(code, message)),
				Some(response) => {
					if response.code != code {
						return Err(ParseResponseError::MixedResponseCode);
					}

					response.push(message);
				}
			}
		}

		response.ok_or(ParseResponseError::EmptyString)
	}
}

#[derive(Error, Debug)]
pub enum ParseResponseError {
	#[error("multiline responses may not mix reply codes")]
	MixedResponseCode,
	#[error("the response was malformed")]
	MalformedResponse,
	#[error("the response code did not make sense")]
	MalformedResponseCode,
	#[error("the response code was invalid")]
	InvalidResponseCode(#[from] ParseIntError),
	#[error("the reply was empty")]
	EmptyString,
}

#[derive(Clone, Copy, Debug)]
pub enum ResponseCode {
	HelpMessage,    // 214
	ServiceReady,   // 220
	ServiceClosing, // 221

	Okay,          // 250
	CannotVrfyUser, // 252 (but will attempt delivery)

	StartMailInput, // 354

	ServiceNotAvailable, // 421 (closing transmission channel)

	UnrecognizedCommand,   // 500
	InvalidParameters,     // 501
	CommandNotImplemented, // 502
	BadCommandSequence,    // 503
	MailboxUnavailable,    // 550
	TransactionFail,       // 554

	UnknownPositiveCompletion(u16), // 2xx
	UnknownPositiveWaiting(u16),    // 3xx
	UnknownNegativeTemporary(u16),  // 4xx
	UnknownNegativePermanent(u16),  // 5xx
}

impl PartialEq for ResponseCode {
	fn eq(&self, other: &Self) -> bool {
		self.as_code() == other.as_code()
	}
}

impl ResponseCode {
	pub fn from_code(code: u16) -> Option<ResponseCode> {
		let response_code = match code {
			214 => Some(ResponseCode::HelpMessage),
			220 => Some(ResponseCode::ServiceReady),
			221 => Some(ResponseCode::ServiceClosing),

			250 => Some(ResponseCode::Okay),
			252 => Some(ResponseCode::CannotVrfyUser),

			354 => Some(ResponseCode::StartMailInput),

			421 => Some(ResponseCode::ServiceNotAvailable),

			500 => Some(ResponseCode::UnrecognizedCommand),
			501 => Some(ResponseCode::InvalidParameters),
			502 => Some(ResponseCode::CommandNotImplemented),
			503 => Some(ResponseCode::BadCommandSequence),
			550 => Some(ResponseCode::MailboxUnavailable),
			554 => Some(ResponseCode::TransactionFail),
			_ => None,
		};

		if response_code.is_none() {
			match code / 100 {
				2 => Some(ResponseCode::UnknownPositiveCompletion(code)),
				3 => Some(ResponseCode::UnknownPositiveWaiting(code)),
				4 => Some(ResponseCode::UnknownNegativeTemporary(code)),
				5 => Some(ResponseCode::UnknownNegativePermanent(code)),
				_ => None,
			}
		} else {
			response_code
		}
	}

	pub fn as_code(self) -> u16 {
		match self {
			ResponseCode::HelpMessage => 214,
			ResponseCode::ServiceReady => 220,
			ResponseCode::ServiceClosing => 221,

			ResponseCode::Okay => 250,
			ResponseCode::CannotVrfyUser => 252,

			ResponseCode::StartMailInput => 354,

			ResponseCode::ServiceNotAvailable => 421,

			ResponseCode::UnrecognizedCommand => 500,
			ResponseCode::InvalidParameters => 501,
			ResponseCode::CommandNotImplemented => 502,
			ResponseCode::BadCommandSequence => 503,
			ResponseCode::MailboxUnavailable => 550,
			ResponseCode::TransactionFail => 554,

			ResponseCode::UnknownPositiveCompletion(code) => code,
			ResponseCode::UnknownPositiveWaiting(code) => code,
			ResponseCode::UnknownNegativeTemporary(code) => code,
			ResponseCode::UnknownNegativePermanent(code) => code,
		}
	}

	pub fn is_negative(&self) -> bool {
		let first = self.as_code() / 100;

		first == 4 || first == 5
	}

	pub fn is_positive(&self) -> bool {
		let first = self.as_code() / 100;

		first == 2 || first == 3
	}
}

impl FromStr for ResponseCode {
	type Err = ParseResponseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.len() == 3 {
			ResponseCode::from_code(s.parse()?).ok_or(ParseResponseError::MalformedResponseCode)
		} else {
			Err(ParseResponseError::MalformedResponseCode)
		}
	}
}
