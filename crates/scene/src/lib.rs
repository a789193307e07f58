pub mod building;
pub mod family;
pub mod headless;
pub mod layer_cache;
pub mod surface;
pub mod validate;
pub mod visibility;
pub mod years;

pub use building::*;
pub use family::*;
pub use headless::*;
pub use layer_cache::*;
pub use surface::*;
pub use validate::*;
pub use visibility::*;
pub use years::*;
