//! # sync-core
//!
//! Pure logic for wearsync (no I/O, instant tests).
//!
//! This crate holds the decisions the protocol makes without touching a
//! transport:
//! - [`ScopeState`] - lifecycle of one scoped operation
//! - [`DisplayTemperatures`] - unit normalization of delivered snapshots
//! - [`WeatherIcon`] - condition code to icon mapping
//!
//! The actual I/O (sessions, sends, record writes) is performed by
//! `sync-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod icon;
pub mod state;
pub mod units;

pub use icon::WeatherIcon;
pub use state::{ScopeAction, ScopeEvent, ScopeState};
pub use units::{celsius_to_fahrenheit, DisplayTemperatures};
