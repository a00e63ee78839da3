pub mod broadcaster;
pub mod gateway;

pub use broadcaster::BroadcastWorker;
pub use gateway::GatewayWorker;
