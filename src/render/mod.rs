mod layout;
mod renderer;

pub use layout::Layout;
pub use renderer::Renderer;
