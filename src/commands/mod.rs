//! Subcommands that only exist in the CLI host

pub mod doctor;

#[cfg(test)]
mod doctor_tests;
