pub mod conditions;
pub mod mechanics;
pub mod text;
