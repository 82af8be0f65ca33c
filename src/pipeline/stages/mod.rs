//! The standard stage chain.
//!
//! Order matters and is fixed by [`Pipeline::standard`](crate::pipeline::Pipeline::standard):
//! CORS headers first so even error responses carry them, envelope
//! initialization second so every later contributor finds `meta` in
//! place, body decoding third, dispatch last.

pub mod cors;
pub mod decode;
pub mod dispatch;
pub mod init;

pub use cors::CorsStage;
pub use decode::{BodyDecoder, DecodeFailure, DecodeStage, JsonDecoder};
pub use dispatch::{DispatchStage, Handler};
pub use init::InitStage;
