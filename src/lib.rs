//! Stochastic simulation of a bacterial population evolving antibiotic
//! resistance in a petri dish.
//!
//! The [`engine`] module holds the population transition. Everything else
//! drives it: configuration, run lifecycle, persistence and analysis.

pub mod analysis;
pub mod config;
pub mod dish;
pub mod engine;
pub mod manager;
pub mod model;
pub mod mutation;
pub mod params;
pub mod reproduction;
pub mod rng;
pub mod run;
pub mod stats;
pub mod survival;
