pub mod display;
pub mod renderer;

pub use display::DisplayChannel;
pub use renderer::LinkRenderer;
