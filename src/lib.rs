//! Quality control of land surface temperature scenes produced by the LST
//! pipeline: load workflow run outputs, classify scenes against operator
//! thresholds, review the borderline ones and deliver the approved set to a
//! customer bucket.

pub mod app;
pub mod argo;
pub mod charts;
pub mod classify;
pub mod collection;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod logging;
pub mod selection;
pub mod services;
pub mod session;
pub mod storage;
pub mod table;
pub mod ui;
