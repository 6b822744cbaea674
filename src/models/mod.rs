pub mod common;
pub mod image;
pub mod lora;
pub mod task;

pub use common::*;
pub use image::*;
pub use lora::*;
pub use task::*;
