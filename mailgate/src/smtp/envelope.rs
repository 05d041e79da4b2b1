use super::args::{ForwardPath, ReversePath};

/// One inbound message, exactly as the ingress assembled it: the envelope
/// addresses and the raw data section. The gate reads the sender off it and
/// nothing else.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
	pub reverse_path: ReversePath,
	pub forward_paths: Vec<ForwardPath>,
	pub data: String,
}

impl Envelope {
	pub fn new() -> Self {
		Self::default()
	}

	/// The bare sender string that gets screened against the allow list.
	pub fn sender(&self) -> String {
		self.reverse_path.sender()
	}

	pub fn push<S: AsRef<str>>(&mut self, line: S) {
		self.data.push_str(line.as_ref());
	}

	/// Take in a String and remove leading periods from lines. This function
	/// does not expect to receive the final ".\r\n" that ends the DATA
	/// command, but will strip it if it's found.
	pub fn raw_data(&mut self, raw_data: &str) {
		// Remove the final \r\n so we don't get an empty string ending our vector
		let mut lines: Vec<&str> = raw_data.trim_end_matches("\r\n").split("\r\n").collect();

		if lines.ends_with(&["."]) {
			lines.pop();
		}

		for line in lines {
			if let Some(stripped) = line.strip_prefix('.') {
				//transparency to allow clients to send \r\n.\r\n without breaking SMTP
				self.push(stripped)
			} else {
				self.push(line)
			}

			self.push("\r\n");
		}
	}

	pub fn clear(&mut self) {
		self.reverse_path = ReversePath::Null;
		self.forward_paths.clear();
		self.data.clear();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn raw_data_strips_terminator() {
		let mut envelope = Envelope::new();
		envelope.raw_data("line1\r\nline2\r\n.\r\n");

		assert_eq!(envelope.data, "line1\r\nline2\r\n");
	}

	#[test]
	fn raw_data_removes_dot_transparency() {
		let mut envelope = Envelope::new();
		envelope.raw_data("line1\r\n..dotted\r\n.\r\n");

		assert_eq!(envelope.data, "line1\r\n.dotted\r\n");
	}

	#[test]
	fn sender_of_null_path_is_empty() {
		let envelope = Envelope::new();

		assert_eq!(envelope.sender(), "");
	}

	#[test]
	fn sender_is_bare() {
		let mut envelope = Envelope::new();
		envelope.reverse_path = "<friend@example.com>".parse().unwrap();

		assert_eq!(envelope.sender(), "friend@example.com");
	}

	#[test]
	fn clear_resets_everything() {
		let mut envelope = Envelope::new();
		envelope.reverse_path = "<friend@example.com>".parse().unwrap();
		envelope.forward_paths = vec!["<inbox@corp.example>".parse().unwrap()];
		envelope.push("hello\r\n");

		envelope.clear();

		assert_eq!(envelope.sender(), "");
		assert!(envelope.forward_paths.is_empty());
		assert!(envelope.data.is_empty());
	}
}
