pub mod clock;
pub mod config;
pub mod error;
pub mod error_utils;
pub mod filter;
pub mod sequence;
pub mod types;
pub mod window;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use filter::*;
pub use sequence::*;
pub use types::*;
pub use window::*;
