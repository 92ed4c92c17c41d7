//! Turning inbound messages into replies.
//!
//! [`orchestrator::ReplyOrchestrator`] runs one turn; [`dispatcher::ConversationDispatcher`]
//! decides whether to run it and serializes turns per conversation.

pub mod dispatcher;
pub mod orchestrator;
pub mod skip;
pub mod strategy;
pub mod trigger;
