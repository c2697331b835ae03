pub mod event_model;
pub mod matcher;
pub mod normalize;
pub mod rules;
