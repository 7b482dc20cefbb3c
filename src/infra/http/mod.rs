mod docs;
mod middleware;

pub use docs::{HttpState, PageSettings, build_router};
pub use middleware::RequestContext;
