#![deny(clippy::all)]

mod error;
mod mock;
mod parse;
mod provider;
mod types;

pub use error::DiscoveryError;
pub use error::ParseError;
pub use mock::MockProvider;
pub use parse::parse_field_output;
pub use provider::LsofProvider;
pub use provider::PortProvider;
pub use types::PortRecord;

pub type Result<T> = std::result::Result<T, DiscoveryError>;
