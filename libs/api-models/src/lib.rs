//! Wire models for the DockLaunch deployment API

pub mod models;
