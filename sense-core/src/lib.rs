#![no_std]

// Shared detection logic for the line-dock interface controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library and exposing trait seams the other crates bind to
// real hardware (or to scripted mocks).

pub mod detect;
pub mod lines;
pub mod telemetry;
pub mod timer;
