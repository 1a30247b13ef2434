pub mod resource_provider;

pub use resource_provider::ResourceProviderClient;
