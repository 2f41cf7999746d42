//! A command line front end for the stop-and-wait simulator: network
//! descriptions, canned simulations and argument handling.

pub mod cli;
pub mod ndl;
pub mod simulations;
