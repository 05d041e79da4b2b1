pub mod args;
mod client;
mod command;
mod envelope;
mod response;
mod server;

pub use client::{Client, ClientError, Output};
pub use command::{Command, ParseCommandError};
pub use envelope::Envelope;
pub use response::{ParseResponseError, Response, ResponseCode};
pub use server::{Event, Server};
