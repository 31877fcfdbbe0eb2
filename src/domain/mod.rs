pub mod alert;
pub mod climate;
pub mod state;

pub use alert::*;
pub use climate::*;
pub use state::*;
