//! Services: authentication, token signing, and the image lifecycle.

pub mod auth;
pub mod images;
