pub mod form;
pub mod prompt;
pub mod theme;

pub use form::{FormAction, FormState};
