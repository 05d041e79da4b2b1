use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
	io::{self, AsyncReadExt, AsyncWriteExt},
	net::{TcpListener, TcpStream},
	sync::watch,
};
use tracing::{debug, info, warn};

use mailgate::{
	net::{relay, RelayError},
	smtp::{
		args::{Address, Domain},
		Envelope, Event, Response, ResponseCode, Server,
	},
	DeliveryHandle, Disposition, Gate, HostConfig,
};

/// The gate's two side effects, spelled in SMTP: rejection is a 550 carrying
/// the reason back to the waiting client, forwarding is a relay to the
/// destination followed by the 250 the client was waiting for.
struct SmtpHandle<'a> {
	stream: &'a mut TcpStream,
	hello: Domain,
	envelope: &'a Envelope,
}

#[async_trait]
impl<'a> DeliveryHandle for SmtpHandle<'a> {
	type Error = DeliveryError;

	async fn reject(&mut self, reason: &str) -> Result<(), Self::Error> {
		let response = Response::with_message(ResponseCode::MailboxUnavailable, reason);
		self.stream
			.write_all(response.as_string().as_bytes())
			.await?;

		Ok(())
	}

	async fn forward(&mut self, destination: &Address) -> Result<(), Self::Error> {
		relay(self.hello.clone(), destination.clone(), self.envelope.clone()).await?;

		let response =
			Response::with_message(ResponseCode::Okay, "message accepted for delivery");
		self.stream
			.write_all(response.as_string().as_bytes())
			.await?;

		Ok(())
	}
}

#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("{0}")]
	Relay(#[from] RelayError),
	#[error("lost the inbound connection")]
	Io(#[from] io::Error),
}

// runs as long as the client remains connected. handles the low-level tcp
// read and write nonsense, passes strings back and forth with the protocol
// logic in Server, and hands complete envelopes to the gate.
async fn serve(
	mut stream: TcpStream,
	gate: Arc<Gate>,
	host: Arc<dyn HostConfig>,
	mut rx: watch::Receiver<bool>,
) -> Result<(), DeliveryError> {
	let (mut transaction, initial_response) = Server::initiate(host.clone());
	stream
		.write_all(initial_response.as_string().as_bytes())
		.await?;

	let mut buf = vec![0; 1024];

	while !transaction.should_exit() {
		let read = tokio::select! {
			read = stream.read(&mut buf) => read?,
			_ = rx.changed() => {
				let notice = Response::with_message(
					ResponseCode::ServiceNotAvailable,
					"service shutting down",
				);
				stream.write_all(notice.as_string().as_bytes()).await?;
				return Ok(());
			},
		};

		// A zero sized read, this connection has died or been terminated by the client
		if read == 0 {
			debug!("connection unexpectedly closed by client");

			return Ok(());
		}

		match transaction.push(String::from_utf8_lossy(&buf[..read]).as_ref()) {
			None => {}
			Some(Event::Reply(response)) => {
				stream.write_all(response.as_string().as_bytes()).await?;
			}
			Some(Event::Received(envelope)) => {
				let sender = envelope.sender();
				let mut handle = SmtpHandle {
					stream: &mut stream,
					hello: host.primary_host(),
					envelope: &envelope,
				};

				// Exactly one of reject or forward happens in here. A forward
				// failure ends the connection without a final reply; the
				// client treats that as a temporary failure and retries.
				match gate.screen(&sender, &mut handle).await? {
					Disposition::Forwarded => info!("forwarded message from '{}'", sender),
					Disposition::Rejected => info!("rejected message from '{}'", sender),
				}
			}
		}
	}

	Ok(())
}

// waits for new connections, dispatches a task to serve each one
pub async fn listen(
	listener: TcpListener,
	gate: Arc<Gate>,
	host: Arc<dyn HostConfig>,
	mut rx: watch::Receiver<bool>,
) {
	loop {
		let (stream, clientaddr) = tokio::select! {
			_ = rx.changed() => break,
			Ok((stream, clientaddr)) = listener.accept() => (stream, clientaddr)
		};

		debug!("connection from {}", clientaddr);

		let gate = gate.clone();
		let host = host.clone();
		let rx = rx.clone();

		tokio::spawn(async move {
			if let Err(err) = serve(stream, gate, host, rx).await {
				warn!("connection ended with an error: {}", err);
			}
		});
	}
}
