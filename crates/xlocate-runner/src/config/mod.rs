pub mod elements;
pub mod params;
pub mod schema;

pub use elements::{ElementRef, Elements, REPLACE_TEXT};
pub use params::{ParamDef, Params};
pub use schema::{BrowserConfig, Config, Expect, Lookup, OnFailure, RetryConfig, TargetUrl};
