//! End-to-end tests for the proving stack
//!
//! Drives artifacts from JSON through every layer:
//! - `witness` solves the assignment from an input document
//! - `prover` runs the setup, proves and verifies
//! - `pipeline` reports progress the way the front ends display it

#[cfg(test)]
mod tests;
