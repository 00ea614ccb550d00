//! DockLaunch Client Library
//!
//! Deploys public GitHub repositories through the DockLaunch service and
//! tracks each deployment from submission to teardown.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
pub mod validate;
