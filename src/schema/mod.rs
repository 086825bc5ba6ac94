pub mod item;
pub mod line;
pub mod speaker;
pub mod value;
