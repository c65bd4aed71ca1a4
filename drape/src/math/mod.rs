pub mod aabb;
pub mod mat33;
pub mod mat34;
pub mod quat;
pub mod vec3;

pub use aabb::*;
pub use mat33::*;
pub use mat34::*;
pub use quat::*;
pub use vec3::*;
