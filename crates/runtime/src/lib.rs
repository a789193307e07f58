pub mod debounce;
pub mod loading;

pub use debounce::*;
pub use loading::*;
