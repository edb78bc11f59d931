pub mod config;
pub mod credentials;
pub mod error;
pub mod outcome;
pub mod post;
pub mod publishers;
pub mod request;
pub mod template;
pub mod wordpress;

pub use config::*;
pub use credentials::*;
pub use error::*;
pub use outcome::*;
pub use post::*;
pub use publishers::*;
pub use request::*;
pub use template::*;
pub use wordpress::*;
