pub mod face_key;
pub mod sampling;
pub mod types;
