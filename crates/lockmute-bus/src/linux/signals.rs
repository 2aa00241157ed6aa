//! [`SignalBus`] over logind and the session-bus screensaver.

use std::sync::Arc;

use async_trait::async_trait;
use zbus::fdo::DBusProxy;
use zbus::names::BusName;
use zbus::{Connection, MatchRule};

use super::routes::{signal_rule, Decode, Router};
use super::LogindBus;
use crate::error::BusError;
use crate::{BusSignal, ScreenSaverTarget, SignalBus, SignalSink, SignalSubject, Subscription};

const MANAGER_PATH: &str = "/org/freedesktop/login1";
const MANAGER_INTERFACE: &str = "org.freedesktop.login1.Manager";
const SESSION_INTERFACE: &str = "org.freedesktop.login1.Session";

fn subscribe_err(subject: &SignalSubject, reason: impl std::fmt::Display) -> BusError {
    BusError::Subscribe {
        subject: subject.to_string(),
        reason: reason.to_string(),
    }
}

/// Ask the bus to deliver every rule in `rules`, then route them to `sink`.
async fn watch(
    connection: &Connection,
    router: &Router,
    subject: &SignalSubject,
    rules: Vec<(MatchRule<'static>, Decode)>,
    sink: SignalSink,
) -> Result<Subscription, BusError> {
    let dbus = DBusProxy::new(connection)
        .await
        .map_err(|e| BusError::call("org.freedesktop.DBus", e))?;

    let mut ids = Vec::with_capacity(rules.len());
    for (rule, decode) in rules {
        if let Err(e) = dbus.add_match_rule(rule.clone()).await {
            router.remove(&ids);
            return Err(subscribe_err(subject, e));
        }
        ids.push(router.add(rule, decode, Arc::clone(&sink)));
    }

    let router = router.clone();
    Ok(Subscription::new(subject.clone(), move || router.remove(&ids)))
}

impl LogindBus {
    async fn subscribe_session(
        &self,
        subject: &SignalSubject,
        path: &str,
        sink: SignalSink,
    ) -> Result<Subscription, BusError> {
        let rules = vec![
            (
                signal_rule(SESSION_INTERFACE, "Lock", path)
                    .map_err(|e| subscribe_err(subject, e))?,
                Decode::Fixed(BusSignal::Lock),
            ),
            (
                signal_rule(SESSION_INTERFACE, "Unlock", path)
                    .map_err(|e| subscribe_err(subject, e))?,
                Decode::Fixed(BusSignal::Unlock),
            ),
        ];
        watch(&self.system, &self.system_routes, subject, rules, sink).await
    }

    async fn subscribe_manager(
        &self,
        subject: &SignalSubject,
        sink: SignalSink,
    ) -> Result<Subscription, BusError> {
        let rule = signal_rule(MANAGER_INTERFACE, "PrepareForSleep", MANAGER_PATH)
            .map_err(|e| subscribe_err(subject, e))?;
        watch(
            &self.system,
            &self.system_routes,
            subject,
            vec![(rule, Decode::PrepareForSleep)],
            sink,
        )
        .await
    }

    async fn subscribe_screensaver(
        &self,
        subject: &SignalSubject,
        target: &ScreenSaverTarget,
        sink: SignalSink,
    ) -> Result<Subscription, BusError> {
        let name =
            BusName::try_from(target.service.as_str()).map_err(|e| subscribe_err(subject, e))?;
        let present = DBusProxy::new(&self.session)
            .await
            .map_err(|e| BusError::call("org.freedesktop.DBus", e))?
            .name_has_owner(name)
            .await
            .map_err(|e| BusError::call("NameHasOwner", e))?;
        if !present {
            return Err(BusError::Unavailable(target.service.clone()));
        }

        let rule = signal_rule(&target.interface, "ActiveChanged", &target.path)
            .map_err(|e| subscribe_err(subject, e))?;
        watch(
            &self.session,
            &self.session_routes,
            subject,
            vec![(rule, Decode::ActiveChanged)],
            sink,
        )
        .await
    }
}

#[async_trait]
impl SignalBus for LogindBus {
    async fn subscribe(
        &mut self,
        subject: &SignalSubject,
        sink: SignalSink,
    ) -> Result<Subscription, BusError> {
        match subject {
            SignalSubject::Session(handle) => {
                self.subscribe_session(subject, &handle.path, sink).await
            }
            SignalSubject::Manager => self.subscribe_manager(subject, sink).await,
            SignalSubject::ScreenSaver(target) => {
                self.subscribe_screensaver(subject, target, sink).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_rules_target_the_session_object() {
        let rule = signal_rule(SESSION_INTERFACE, "Lock", "/org/freedesktop/login1/session/_32")
            .unwrap();
        let text = rule.to_string();
        assert!(text.contains("type='signal'"));
        assert!(text.contains("interface='org.freedesktop.login1.Session'"));
        assert!(text.contains("member='Lock'"));
        assert!(text.contains("path='/org/freedesktop/login1/session/_32'"));
    }

    #[test]
    fn invalid_path_is_rejected() {
        assert!(signal_rule(MANAGER_INTERFACE, "PrepareForSleep", "not a path").is_err());
    }
}
