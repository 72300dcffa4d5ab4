/// Request extractors shared by RPC handlers
///
/// - `deadline`: Caller deadline from the `grpc-timeout` header

pub mod deadline;
