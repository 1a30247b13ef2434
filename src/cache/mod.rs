pub mod client_cache;

pub use client_cache::ClientRegistry;
