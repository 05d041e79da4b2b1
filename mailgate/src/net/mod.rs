use std::{net::IpAddr, time::Duration};

use thiserror::Error;
use tokio::{
	io::{AsyncReadExt, AsyncWriteExt},
	net::TcpStream,
	time::{error::Elapsed, timeout},
};
use tracing::{debug, trace, warn};

use crate::smtp::{
	args::{Address, Domain},
	Client, ClientError, Envelope,
};

use self::dns::DnsLookup;

pub mod dns;

/// How long we'll wait on the destination server before giving up on it.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(2500);
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Deliver an envelope to a single destination mailbox over SMTP.
///
/// This is the forward side effect behind the gate: anything that goes
/// wrong in here surfaces to the caller as a [`RelayError`], untouched.
/// There are no retries and no bounce messages at this layer.
pub async fn relay(
	hello: Domain,
	destination: Address,
	envelope: Envelope,
) -> Result<(), RelayError> {
	let ip = match &destination.domain {
		Domain::FQDN(name) => {
			DnsLookup::new(&format!("{}.", name))
				.await?
				.next_address()
				.await?
		}
		Domain::Literal(ip) => *ip,
	};

	debug!("relaying for {} to {}:25", destination, ip);
	send_to_ip(ip, hello, destination, envelope).await
}

async fn send_to_ip(
	addr: IpAddr,
	hello: Domain,
	destination: Address,
	envelope: Envelope,
) -> Result<(), RelayError> {
	let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect((addr, 25))).await??;

	let mut client = Client::initiate(hello, destination, envelope);

	let mut buf = vec![0; 1024];

	while !client.should_exit() {
		let read = stream.read(&mut buf).await?;

		// A zero sized read, this connection has died or been terminated by the server
		if read == 0 {
			warn!("connection unexpectedly closed by server");
			return Err(RelayError::ConnectionClosed);
		}

		trace!("<- {}", String::from_utf8_lossy(&buf[..read]).trim_end());

		let output = client.push(String::from_utf8_lossy(&buf[..read]).as_ref())?;

		if let Some(output) = output {
			trace!("-> {}", output.to_string().trim_end());

			timeout(WRITE_TIMEOUT, stream.write_all(output.to_string().as_bytes())).await??;
		}
	}

	Ok(())
}

#[derive(Debug, Error)]
pub enum RelayError {
	#[error("could not resolve the destination domain")]
	Dns(#[from] dns::DnsLookupError),
	#[error("timed out before reaching the server")]
	Timeout(#[from] Elapsed),
	#[error("connection unexpectedly closed by server")]
	ConnectionClosed,
	#[error("there was an error connecting to the host")]
	Connection(#[from] std::io::Error),
	#[error("{0}")]
	Delivery(#[from] ClientError),
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	#[ignore] //only run in CI contexts
	fn send_trigger() {
		//delivers a real message to an address set by the environment
		use std::env::var;

		let destination: Address = var("TRIGGER_EMAIL").unwrap().parse().unwrap();

		let mut envelope = Envelope::new();
		envelope.reverse_path = "<trigger@localhost>".parse().unwrap();
		envelope.push("relay trigger\r\n");

		let future = relay("localhost".parse().unwrap(), destination, envelope);

		let result = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()
			.unwrap()
			.block_on(future);

		assert!(result.is_ok(), "{:?}", result);
	}
}
