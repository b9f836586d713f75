//! Credential hashing for application users and engine principals.

pub mod password;
