//! Station Forge - REVALIDA Clinical Station Pipeline
//!
//! This crate repairs, validates and persists LLM-generated clinical
//! station documents for medical licensing exam simulations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
