#![allow(dead_code)]
pub mod flow_harness;

pub use flow_harness::*;
