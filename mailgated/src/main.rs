mod config;
mod host;
mod net;

use std::sync::Arc;

use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mailgate::{AllowList, Gate, GateConfig, HostConfig};

use config::Config;
use host::Host;

#[tokio::main]
async fn main() {
	let config = match Config::get() {
		Some(conf) => conf,
		None => return,
	};

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let host: Arc<dyn HostConfig> = match Host::new(config.hostnames.clone()) {
		Some(host) => Arc::new(host),
		None => {
			eprintln!("no hostnames configured. Who are we accepting mail for?");
			return;
		}
	};

	let gate = Arc::new(Gate::new(GateConfig {
		allow: AllowList::new(config.allow_from.clone()),
		destination: config.destination.clone(),
	}));

	let listener = match TcpListener::bind(config.socket_address()).await {
		Ok(listener) => listener,
		Err(err) => {
			error!("could not bind {}: {}", config.socket_address(), err);
			return;
		}
	};

	info!(
		"listening on {}, forwarding allowed senders to {}",
		config.socket_address(),
		config.destination
	);

	let (tx, rx) = watch::channel(false);

	let listen_task = tokio::spawn(net::listen(listener, gate, host, rx));

	let signal_listener = tokio::spawn(async {
		use tokio::signal::unix::{signal, SignalKind};
		let mut a = (
			tokio::signal::ctrl_c(),
			signal(SignalKind::hangup()).unwrap(),
			signal(SignalKind::interrupt()).unwrap(),
			signal(SignalKind::quit()).unwrap(),
			signal(SignalKind::terminate()).unwrap(),
		);
		tokio::select! {
			_ = a.0 => (),
			_ = a.1.recv() => (),
			_ = a.2.recv() => (),
			_ = a.3.recv() => (),
			_ = a.4.recv() => ()
		};
	});

	#[allow(unused_must_use)]
	{
		signal_listener.await;
		info!("received shutdown signal, beginning graceful shutdown...");
		tx.send(true);
		listen_task.await;
	}
}
