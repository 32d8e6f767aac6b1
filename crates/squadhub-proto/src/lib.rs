//! # squadhub-proto
//!
//! Wire contract of the squadhub gateway protocol: request, response and
//! event frames, the connect handshake, and the chat, session, cron and
//! health payloads carried inside them. No I/O lives here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod cron;
pub mod error;
pub mod events;
pub mod frame;
pub mod handshake;
pub mod methods;
pub mod session;

pub use chat::{
    ChatAbortParams, ChatAttachment, ChatEvent, ChatEventState, ChatHistoryParams,
    ChatHistoryResponse, ChatMessage, ChatSendParams, ChatSendResult, ChatUsage, MessageContent,
    MessageRole,
};
pub use cron::{
    CronAddJob, CronJob, CronJobState, CronListResult, CronPayload, CronSchedule,
    CronSessionTarget, CronWakeMode,
};
pub use error::ProtoError;
pub use events::GatewayEvent;
pub use frame::{EventFrame, Frame, GatewayError, RequestFrame, ResponseFrame};
pub use handshake::{
    ClientInfo, ConnectParams, DEFAULT_ROLE, DEFAULT_SCOPES, HelloOk, PROTOCOL_VERSION,
};
pub use session::{
    ChannelStatus, GatewayHealthResult, Session, SessionsListParams, SessionsListResult,
};
