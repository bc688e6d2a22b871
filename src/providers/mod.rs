pub mod dolar_api;

pub use dolar_api::DolarApiProvider;
