//! Integration and adversarial test suite for Drip.
//!
//! The tests wire the real components together the way a deployment does
//! and attack the mint clock, the authorization checks and the stake
//! custody from a caller's perspective.

pub mod helpers;
