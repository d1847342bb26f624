pub mod digest;
pub mod subscription;
