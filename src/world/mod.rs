mod camera;
mod texture;

pub use camera::Camera;

pub use texture::{NO_TEXTURE, Palette, Texture, TextureBank, TextureError, TextureId};
