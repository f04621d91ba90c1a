//! Data models for keygate.
//!
//! - `Account`: a registered identity and its secret hash
//! - Wire types (`Credentials`, `RegisterResponse`, `LoginResponse`, ...):
//!   request and response bodies for the register, login and profile operations

pub mod account;
pub mod wire;

pub use account::Account;
pub use wire::{Credentials, ErrorBody, LoginResponse, ProfileResponse, RegisterResponse};
