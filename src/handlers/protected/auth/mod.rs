mod session;

pub use session::{delete_account, logout, whoami};
