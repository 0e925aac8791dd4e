pub mod artifact;
pub mod shell;
pub mod template;
