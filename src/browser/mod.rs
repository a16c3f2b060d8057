pub mod acquirer;
pub mod connection;
pub mod headless;

pub use acquirer::{
    discover_submit_url, find_submit_link, ChromiumAcquirer, ContentAcquirer, PageContent,
};
pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;
