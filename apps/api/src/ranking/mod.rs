// CV ranking: experience estimation, keyword scoring and the ranking engine.
// Analysis-mode scoring goes through crate::analysis providers only.

pub mod engine;
pub mod experience;
pub mod handlers;
pub mod keywords;
pub mod settings;
