pub mod session;

pub use session::{QaPair, Session};
