mod auth_service_fake;
mod auth_service_impl;
mod rotation_controller;
mod token_codec_jwt;
mod token_issuer;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use rotation_controller::*;
pub use token_codec_jwt::*;
pub use token_issuer::*;

#[cfg(test)]
pub(crate) mod test_support;
