//! Typed wrappers for the gateway methods this workspace consumes.

use serde_json::{json, Value};
use squadhub_proto::{
    methods, ChatAbortParams, ChatHistoryParams, ChatHistoryResponse, ChatSendParams,
    ChatSendResult, CronAddJob, CronJob, CronListResult, GatewayHealthResult, SessionsListParams,
    SessionsListResult,
};
use uuid::Uuid;

use crate::client::GatewayClient;
use crate::error::GatewayClientError;

impl GatewayClient {
    /// `health`: gateway and channel health.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn health(&self) -> Result<GatewayHealthResult, GatewayClientError> {
        self.call(methods::HEALTH, &json!({})).await
    }

    /// `status`: free-form gateway status summary.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn status(&self) -> Result<Value, GatewayClientError> {
        self.request(methods::STATUS, json!({})).await
    }

    /// `chat.send`. An empty idempotency key is replaced with a fresh UUID;
    /// the gateway uses it as the run id.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn chat_send(
        &self,
        mut params: ChatSendParams,
    ) -> Result<ChatSendResult, GatewayClientError> {
        if params.idempotency_key.is_empty() {
            params.idempotency_key = Uuid::new_v4().to_string();
        }
        let mut result: ChatSendResult = self.call(methods::CHAT_SEND, &params).await?;
        if result.run_id.is_none() {
            result.run_id = Some(params.idempotency_key);
        }
        Ok(result)
    }

    /// `chat.history` for one session.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn chat_history(
        &self,
        session_key: &str,
        limit: Option<u32>,
    ) -> Result<ChatHistoryResponse, GatewayClientError> {
        let params = ChatHistoryParams {
            session_key: session_key.to_string(),
            limit,
        };
        self.call(methods::CHAT_HISTORY, &params).await
    }

    /// `chat.abort`: stop the given run, or the session's active run.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn chat_abort(
        &self,
        session_key: &str,
        run_id: Option<&str>,
    ) -> Result<Value, GatewayClientError> {
        let params = ChatAbortParams {
            session_key: session_key.to_string(),
            run_id: run_id.map(str::to_string),
        };
        self.call(methods::CHAT_ABORT, &params).await
    }

    /// `sessions.list`.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn sessions_list(
        &self,
        params: &SessionsListParams,
    ) -> Result<SessionsListResult, GatewayClientError> {
        self.call(methods::SESSIONS_LIST, params).await
    }

    /// `cron.list`.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn cron_list(&self) -> Result<CronListResult, GatewayClientError> {
        self.call(methods::CRON_LIST, &json!({})).await
    }

    /// `cron.add`; returns the stored job.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::request`].
    pub async fn cron_add(&self, job: &CronAddJob) -> Result<CronJob, GatewayClientError> {
        self.call(methods::CRON_ADD, job).await
    }
}
