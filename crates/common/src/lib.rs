pub mod address;
pub mod clock;
pub mod error;
pub mod token;

pub use address::Address;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{Error, Result, WalletError};
pub use token::SessionToken;
