//! The expression filter evaluated against feature attributes before a
//! feature is admitted into a tile (§4.8 step 3).

mod ast;
mod eval;
mod value;

pub use ast::Expr;
pub use eval::{coerce_bool, evaluate, evaluate_with_warnings, Tri};
pub use value::{AttrValue, Literal};
