//! Session-scoped interactive state engines for the lenslet display apps.
//!
//! Everything in this crate is pure: state machines mutated by explicit
//! calls, with randomness and clocks injected by the caller. The service
//! crate owns all timers, transports, and I/O; the engines here only
//! decide what to show and for how long.

pub mod board;
pub mod game;
pub mod prompter;
pub mod scroll;
pub mod search;
pub mod wrap;
