pub mod cli;
mod render;

pub use application::context::AppContext;
