//! Capability traits for external collaborators
//!
//! The engine talks to the session/monitoring notifier and the message-bus
//! publisher through these traits without depending on a concrete transport.
//! Deployments wire real implementations; the no-op variants keep the engine
//! runnable without either collaborator.

use async_trait::async_trait;

use crate::events::{FileReferenceEvent, RequestsGroupEvent};
use crate::models::SessionInfo;

/// Counters surfaced to the session/monitoring collaborator.
#[async_trait]
pub trait SessionNotifier: Send + Sync {
    async fn increment_running_requests(&self, session: &SessionInfo);

    async fn decrement_running_requests(&self, session: &SessionInfo);

    async fn increment_reference_requests(&self, session: &SessionInfo);

    async fn increment_referenced_files(&self, session: &SessionInfo);

    async fn increment_denied_requests(&self, session: &SessionInfo);
}

/// No-op implementation for deployments without a monitoring collaborator.
pub struct NoOpSessionNotifier;

#[async_trait]
impl SessionNotifier for NoOpSessionNotifier {
    async fn increment_running_requests(&self, _session: &SessionInfo) {}

    async fn decrement_running_requests(&self, _session: &SessionInfo) {}

    async fn increment_reference_requests(&self, _session: &SessionInfo) {}

    async fn increment_referenced_files(&self, _session: &SessionInfo) {}

    async fn increment_denied_requests(&self, _session: &SessionInfo) {}
}

/// Outbound event publication to the message bus.
///
/// Publication is fire-and-forget from the engine's perspective: transport
/// errors are the publisher's to log and retry, they never fail a batch.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_file_event(&self, event: FileReferenceEvent);

    async fn publish_group_event(&self, event: RequestsGroupEvent);
}

/// No-op implementation for internal-only deployments.
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_file_event(&self, _event: FileReferenceEvent) {}

    async fn publish_group_event(&self, _event: RequestsGroupEvent) {}
}
