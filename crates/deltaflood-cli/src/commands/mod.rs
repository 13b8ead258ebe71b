mod check;
mod render;
mod stream;

pub use check::cmd_check;
pub use render::cmd_render;
pub use stream::{cmd_stream, StreamArgs};
