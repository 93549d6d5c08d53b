pub mod dispatcher;
pub mod reply;
pub mod server;
pub mod stream;

pub use dispatcher::{build_router, AppState};
pub use reply::ApiError;
pub use server::AssayServer;
