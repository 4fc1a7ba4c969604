//! Canonical structured event names used across `msg-relay`.

// Registry and service lifecycle events.
pub const SERVICE_START: &str = "service_start";
pub const SERVICE_START_OK: &str = "service_start_ok";
pub const SERVICE_START_PARTIAL: &str = "service_start_partial";
pub const SERVICE_STOP: &str = "service_stop";
pub const SERVICE_STOP_OK: &str = "service_stop_ok";
pub const SERVICE_STOP_IGNORED: &str = "service_stop_ignored";
pub const BACKEND_NOT_REGISTERED: &str = "backend_not_registered";
pub const BACKEND_CONSTRUCTION_FAILED: &str = "backend_construction_failed";
pub const BACKEND_START_FAILED: &str = "backend_start_failed";
pub const BACKEND_STARTED: &str = "backend_started";
pub const BACKEND_STOPPED: &str = "backend_stopped";

// Dispatch pool events.
pub const DISPATCH_ROUTED: &str = "dispatch_routed";
pub const DISPATCH_ROUTING_FAILED: &str = "dispatch_routing_failed";
pub const DISPATCH_WORKER_EXIT: &str = "dispatch_worker_exit";
pub const DISPATCH_MESSAGES_ABANDONED: &str = "dispatch_messages_abandoned";

// Sender queue events.
pub const SENDER_PUSH_REJECTED: &str = "sender_push_rejected";
pub const SENDER_QUEUE_CLOSED: &str = "sender_queue_closed";
pub const SENDER_WORKER_EXIT: &str = "sender_worker_exit";
pub const SENDER_DELIVERY_FAILED: &str = "sender_delivery_failed";
pub const SENDER_MESSAGE_MALFORMED: &str = "sender_message_malformed";

// Source worker events.
pub const SOURCE_WORKER_TRANSIENT: &str = "source_worker_transient";
pub const SOURCE_WORKER_FATAL: &str = "source_worker_fatal";
pub const SOURCE_WORKER_CANCELLED: &str = "source_worker_cancelled";
pub const SOURCE_OFFSET_STORE_FAILED: &str = "source_offset_store_failed";

// Runtime events.
pub const WORKER_GROUP_JOINED: &str = "worker_group_joined";

// Outbound transport events.
pub const TRANSPORT_CONNECTED: &str = "transport_connected";
pub const TRANSPORT_CONNECT_FAILED: &str = "transport_connect_failed";
pub const TRANSPORT_SEND_RETRY: &str = "transport_send_retry";
pub const TRANSPORT_CLOSED: &str = "transport_closed";
pub const TRANSPORT_CLOSE_FAILED: &str = "transport_close_failed";
