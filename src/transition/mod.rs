pub mod easing;
pub mod interpolator;
pub mod task;
