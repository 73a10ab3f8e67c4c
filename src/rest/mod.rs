//! REST endpoint wrappers
//!
//! Stateless request/response calls; the streaming feeds carry all the
//! stateful behavior.

mod private;
mod public;

pub use private::{Balance, MyTrade, OrderStatus, PrivateClient};
pub use public::{PublicClient, RestLevel, RestOrderBook, PastTrade, Ticker};
