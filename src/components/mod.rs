pub mod app;
pub mod viewer;
