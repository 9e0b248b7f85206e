pub mod headless;
pub mod viewport;
