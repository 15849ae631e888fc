pub mod calculate;
pub mod export;
pub mod health;
pub mod protocols;
