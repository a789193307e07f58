pub mod popup;
pub mod range_marks;
pub mod symbology;

pub use popup::*;
pub use range_marks::*;
pub use symbology::*;
