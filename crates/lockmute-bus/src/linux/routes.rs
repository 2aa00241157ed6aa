//! Per-connection signal routing.
//!
//! One task reads every message a connection receives and hands matching
//! signals to their sinks in socket order. Subscribers on the same connection
//! therefore never observe signals out of order relative to each other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tracing::{debug, warn};
use zbus::message::Type as MessageType;
use zbus::{Connection, MatchRule, Message, MessageStream};

use crate::{BusSignal, SignalSink};

/// How a matched message becomes a [`BusSignal`].
#[derive(Debug, Clone, Copy)]
pub(super) enum Decode {
    /// The member alone determines the signal.
    Fixed(BusSignal),
    /// `PrepareForSleep(b start)`.
    PrepareForSleep,
    /// `ActiveChanged(b active)`.
    ActiveChanged,
}

impl Decode {
    fn decode(self, msg: &Message) -> zbus::Result<BusSignal> {
        Ok(match self {
            Self::Fixed(signal) => signal,
            Self::PrepareForSleep => {
                let (start,) = msg.body().deserialize::<(bool,)>()?;
                BusSignal::PrepareForSleep(start)
            }
            Self::ActiveChanged => {
                let (active,) = msg.body().deserialize::<(bool,)>()?;
                BusSignal::ActiveChanged(active)
            }
        })
    }
}

struct Route {
    id: u64,
    rule: MatchRule<'static>,
    decode: Decode,
    sink: SignalSink,
}

#[derive(Default)]
struct RouteTable {
    next_id: u64,
    routes: Vec<Route>,
}

/// Routing table shared between a connection's reader task and subscribers.
#[derive(Clone, Default)]
pub(super) struct Router {
    table: Arc<Mutex<RouteTable>>,
}

impl Router {
    /// Start reading `connection`. The task lives as long as the connection.
    pub(super) fn spawn(connection: &Connection, bus: &'static str) -> Self {
        let router = Self::default();
        let reader = router.clone();
        let mut stream = MessageStream::from(connection);
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(msg) => reader.dispatch(&msg),
                    Err(e) => warn!(bus, error = %e, "failed to read message"),
                }
            }
            debug!(bus, "message stream ended");
        });
        router
    }

    fn lock(&self) -> MutexGuard<'_, RouteTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn add(&self, rule: MatchRule<'static>, decode: Decode, sink: SignalSink) -> u64 {
        let mut table = self.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.routes.push(Route {
            id,
            rule,
            decode,
            sink,
        });
        id
    }

    pub(super) fn remove(&self, ids: &[u64]) {
        self.lock().routes.retain(|route| !ids.contains(&route.id));
    }

    fn dispatch(&self, msg: &Message) {
        if msg.message_type() != MessageType::Signal {
            return;
        }
        // Sinks run outside the lock so they may subscribe or unsubscribe.
        let hits: Vec<(Decode, SignalSink)> = self
            .lock()
            .routes
            .iter()
            .filter(|route| route.rule.matches(msg).unwrap_or(false))
            .map(|route| (route.decode, Arc::clone(&route.sink)))
            .collect();

        for (decode, sink) in hits {
            match decode.decode(msg) {
                Ok(signal) => sink(signal),
                Err(e) => warn!(error = %e, ?decode, "malformed signal"),
            }
        }
    }
}

/// Match rule for `interface.member` emitted by the object at `path`.
pub(super) fn signal_rule(
    interface: &str,
    member: &'static str,
    path: &str,
) -> zbus::Result<MatchRule<'static>> {
    Ok(MatchRule::builder()
        .msg_type(MessageType::Signal)
        .interface(interface.to_string())?
        .member(member)?
        .path(path.to_string())?
        .build())
}
