//! LiteCNN network: topology, execution plan and forward pass

pub mod architecture;
pub mod execution_plan;
pub mod network;

pub use architecture::{BlockConfig, BlockNames, NetworkConfig};
pub use execution_plan::{
    BatchNormWeights, BlockPlan, ClassifierPlan, ExecutionPlan, SePlan, StemPlan,
};
pub use network::{forward, LiteCnn};
