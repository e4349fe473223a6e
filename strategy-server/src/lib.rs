//! Journey strategy server.
//!
//! Answers: "if I leave now and take whichever departure the plan says,
//! when will I actually arrive?" Delays are modelled as per-minute
//! probability distributions and propagated backward from the destination.

pub mod cache;
pub mod delays;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod graph;
pub mod walkable;
pub mod web;
