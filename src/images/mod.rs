pub mod form;
pub mod paths;
pub mod services;
