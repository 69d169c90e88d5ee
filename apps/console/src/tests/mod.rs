mod error;
mod logger;
mod repl;
