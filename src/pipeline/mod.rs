pub mod context;
pub mod domain;
pub mod orchestration;
pub mod services;
