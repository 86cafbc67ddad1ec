// Library exports for the binary and integration tests

pub mod config;
pub mod middleware;
pub mod mock;
pub mod raml;
pub mod response;
pub mod server;

pub use config::{MockConfig, SelectionMode};
pub use mock::{MockDocument, MockError, RouteTable};
pub use raml::{load_file, parse_str, DocumentLoadError};
pub use server::{MockServer, MockService};
