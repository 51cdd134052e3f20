pub mod session;

pub use session::{change_password, whoami};
