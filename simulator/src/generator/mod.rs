pub mod scene;
pub mod trajectory;
