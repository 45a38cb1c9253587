pub mod levels;
pub mod simulation;
