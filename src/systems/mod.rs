pub mod combat;
pub mod enemy;
pub mod harvest;
pub mod movement;
