//! Deployment lifecycle

pub mod controller;
pub mod fsm;
