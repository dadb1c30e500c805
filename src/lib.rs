//! qcsim: streaming Bayesian quality-control simulator
//!
//! Simulates a noisy manufacturing and measurement process. Each tick draws a
//! unit, observes it through a noisy instrument, updates a fixed Gaussian prior
//! with the observation and flags the unit when the posterior probability of
//! being within spec falls below a threshold. Results are kept in a trailing
//! time window for live display.

pub mod cli;
pub mod core;
pub mod sim;
pub mod yaml;
