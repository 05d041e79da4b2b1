pub mod config;
pub mod gate;
pub mod net;
pub mod policy;
pub mod smtp;

pub use config::HostConfig;
pub use gate::{DeliveryHandle, Disposition, Gate, GateConfig};
pub use policy::{AllowList, Verdict};
