pub mod context;
pub mod oneshot;
pub mod repl;
