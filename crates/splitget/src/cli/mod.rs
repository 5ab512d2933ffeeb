pub mod app;
pub mod download;

pub use app::App;
