//! The mount-parameter mini-language.
//!
//! A launch configuration can carry a short parameter string that tweaks how
//! game data is attached: suppress the auto-mount entirely, or attach extra
//! volumes alongside the primary image. This crate turns that string into an
//! ordered list of directives; the effects live in `gdmount-mount`.

mod error;
mod parser;
mod registry;

pub use error::GrammarError;
pub use parser::parse;
pub use registry::{DIRECTIVES, Directive, DirectiveShape, DirectiveSpec, Phase, lookup};
