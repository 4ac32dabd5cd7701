mod brl;

pub mod helpers;
pub mod op;
mod secret;

pub use brl::{Brl, BrlConversionError, BRL_CURRENCY_CODE, BRL_CURRENCY_CODE_LOWER};
pub use secret::Secret;
