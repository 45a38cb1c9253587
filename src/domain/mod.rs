pub mod asteroid;
pub mod bullet;
pub mod entity;
pub mod roster;
pub mod ship;
pub mod tuning;
pub mod world;
