//! Configuration module

mod site;

pub use site::SiteConfig;
pub use site::UtterancesConfig;
pub use site::{ENV_ACCESS_TOKEN, ENV_API_ENDPOINT};
