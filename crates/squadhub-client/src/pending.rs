//! In-flight request bookkeeping.
//!
//! Maps request id to the caller waiting on it. Responses are matched by id
//! only, so the gateway may answer in any order.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use squadhub_proto::ResponseFrame;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::GatewayClientError;

/// Outcome delivered to a waiting caller.
pub(crate) type Reply = Result<Value, GatewayClientError>;

struct PendingCall {
    method: String,
    issued_at: Instant,
    reply: oneshot::Sender<Reply>,
}

/// Pending calls of one connection.
#[derive(Default)]
pub(crate) struct PendingRequests {
    calls: Mutex<HashMap<String, PendingCall>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a call and hand back the slot its outcome arrives on.
    pub(crate) fn register(
        &self,
        id: &str,
        method: &str,
    ) -> Result<oneshot::Receiver<Reply>, GatewayClientError> {
        let (tx, rx) = oneshot::channel();
        let mut calls = self.calls.lock();
        if calls.contains_key(id) {
            return Err(GatewayClientError::Protocol(format!(
                "duplicate request id {id}"
            )));
        }
        calls.insert(
            id.to_string(),
            PendingCall {
                method: method.to_string(),
                issued_at: Instant::now(),
                reply: tx,
            },
        );
        Ok(rx)
    }

    /// Deliver a response to its caller.
    ///
    /// Returns `false` when no call with that id is pending (stale or
    /// unknown); nothing else is touched in that case.
    pub(crate) fn resolve(&self, response: ResponseFrame) -> bool {
        let Some(call) = self.calls.lock().remove(&response.id) else {
            return false;
        };
        trace!(
            id = %response.id,
            method = %call.method,
            ok = response.ok,
            elapsed_ms = call.issued_at.elapsed().as_millis() as u64,
            "resolved request"
        );
        let outcome = response.into_result().map_err(GatewayClientError::Gateway);
        // The caller may have stopped waiting; that is fine.
        let _ = call.reply.send(outcome);
        true
    }

    /// Forget a call whose caller gave up (timeout).
    pub(crate) fn abandon(&self, id: &str) -> bool {
        self.calls.lock().remove(id).is_some()
    }

    /// Fail every pending call with `error` and empty the map.
    ///
    /// Returns how many calls were rejected.
    pub(crate) fn reject_all(&self, error: &GatewayClientError) -> usize {
        let drained: Vec<(String, PendingCall)> = self.calls.lock().drain().collect();
        let count = drained.len();
        for (id, call) in drained {
            debug!(id = %id, method = %call.method, error = %error, "rejecting pending request");
            let _ = call.reply.send(Err(error.clone()));
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use squadhub_proto::GatewayError;

    #[test]
    fn resolve_delivers_result_to_matching_caller() {
        let pending = PendingRequests::new();
        let mut rx = pending.register("a", "chat.send").unwrap();

        assert!(pending.resolve(ResponseFrame::ok("a", json!({"ack": true}))));
        assert_eq!(rx.try_recv().unwrap().unwrap(), json!({"ack": true}));
        assert!(pending.is_empty());
    }

    #[test]
    fn resolve_delivers_gateway_error() {
        let pending = PendingRequests::new();
        let mut rx = pending.register("a", "cron.add").unwrap();

        pending.resolve(ResponseFrame::err("a", GatewayError::new("INVALID_REQUEST", "no")));
        let err = rx.try_recv().unwrap().unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn unknown_id_is_dropped_without_touching_others() {
        let pending = PendingRequests::new();
        let mut rx = pending.register("a", "health").unwrap();

        assert!(!pending.resolve(ResponseFrame::ok("zzz", json!(1))));
        assert_eq!(pending.len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn duplicate_id_is_refused() {
        let pending = PendingRequests::new();
        let _rx = pending.register("a", "health").unwrap();
        assert!(matches!(
            pending.register("a", "health"),
            Err(GatewayClientError::Protocol(_))
        ));
    }

    #[test]
    fn abandoned_call_ignores_late_response() {
        let pending = PendingRequests::new();
        let _rx = pending.register("a", "slow").unwrap();

        assert!(pending.abandon("a"));
        assert!(!pending.resolve(ResponseFrame::ok("a", json!(null))));
        assert!(!pending.abandon("a"));
    }

    #[test]
    fn reject_all_fails_every_call_and_empties_map() {
        let pending = PendingRequests::new();
        let mut receivers: Vec<_> = (0..5)
            .map(|i| pending.register(&i.to_string(), "m").unwrap())
            .collect();

        let rejected = pending.reject_all(&GatewayClientError::ConnectionClosed);

        assert_eq!(rejected, 5);
        assert!(pending.is_empty());
        for rx in &mut receivers {
            assert!(matches!(
                rx.try_recv().unwrap(),
                Err(GatewayClientError::ConnectionClosed)
            ));
        }
    }

    proptest! {
        #[test]
        fn responses_match_by_id_in_any_order(
            order in (1usize..32).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        ) {
            let pending = PendingRequests::new();
            let mut receivers: Vec<_> = (0..order.len())
                .map(|i| pending.register(&format!("req-{i}"), "m").unwrap())
                .collect();

            for &i in &order {
                let resolved = pending.resolve(ResponseFrame::ok(format!("req-{i}"), json!({"n": i})));
                prop_assert!(resolved, "response req-{} was not matched", i);
            }

            prop_assert!(pending.is_empty());
            for (i, rx) in receivers.iter_mut().enumerate() {
                prop_assert_eq!(rx.try_recv().unwrap().unwrap(), json!({"n": i}));
            }
        }
    }
}
