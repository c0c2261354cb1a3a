pub mod auth;
pub mod clock;
pub mod config;
pub mod contract;
pub mod cycles;
pub mod matches;
pub mod profile;
pub mod state;
pub mod validation;
