pub mod normalize;
pub mod pipeline;
pub mod protocol;
pub mod request;
pub mod session;
pub mod source;

pub use normalize::*;
pub use pipeline::*;
pub use protocol::*;
pub use request::*;
pub use session::*;
pub use source::*;
