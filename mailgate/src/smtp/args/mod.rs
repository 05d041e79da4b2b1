mod address;
mod domain;
mod path;
mod validator;

pub use address::*;
pub use domain::*;
pub use path::*;
pub use validator::*;
