pub mod common;

mod credentials;
mod lro_http_flow;
