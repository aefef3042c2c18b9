//! Runtime modules shared with emitted artifacts.
//!
//! `helpers` and `encoders` are written under the constraints of generated
//! code (standard library only for `helpers`; `chrono`/`uuid`/`serde_json`
//! only for `encoders`) because their source text is emitted verbatim into
//! user crates.

pub mod encoders;
pub mod helpers;
