pub mod descriptor;

pub use descriptor::{build_url, encode_body, RequestDescriptor, RequestOptions};
