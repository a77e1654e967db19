//! Core non-network logic for list views: persisted-state codec, page-link
//! window and the filter state machine.

pub mod codec;
pub mod filter;
pub mod pagination;

pub use codec::{CodecDefaults, QueryMap, decode, encode};
pub use filter::FilterMachine;
pub use pagination::{PageWindow, compute_window};
