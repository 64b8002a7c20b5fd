pub mod dynamo_repo;
pub mod memory_repo;
pub mod provisioning;
