/// Per-match turn coordination.
pub mod coordinator;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match room registry: pairing, dispatch and release.
pub mod match_service;
/// Outbound delivery to players.
pub mod notifier;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
