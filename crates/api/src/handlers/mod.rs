pub mod alerts;
pub mod events;
pub mod machines;
pub mod maintenance;
pub mod predict;
