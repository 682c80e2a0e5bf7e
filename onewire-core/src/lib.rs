#![no_std]
#![deny(missing_docs)]
//! # onewire-core
//! A no-std implementation of the 1-Wire master protocol.
//!
//! This crate provides a trait-based interface for 1-Wire communication, allowing you to implement the protocol on various platforms.
//! [OneWire] trait defines the time-critical bit primitives an implementation has to provide (bus reset, writing and reading single bits),
//! and builds byte transfers and the standard ROM commands (read, match, skip and search ROM) on top of them.
//!
//! The crate also provides the search algorithm for discovering devices on the 1-Wire bus, implemented in the [OneWireSearch] struct,
//! the [Address] type for 64-bit ROM codes and the Dallas/Maxim CRC-8 in [OneWireCrc].

mod address;
pub mod consts;
mod error;
mod search;
mod traits;
mod utils;
pub use address::Address;
pub use error::OneWireError;
pub use search::{
    MAX_BUS_FAULTS, OneWireSearch, OneWireSearchKind, SearchEnd, SearchReport,
};
pub use traits::{OneWire, Presence};
pub use utils::OneWireCrc;

/// Error type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
