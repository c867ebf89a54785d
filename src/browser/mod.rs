pub mod dom;
pub mod wait;

mod session;

pub use session::BrowserSession;
