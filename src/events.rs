//! Client events and observers
//!
//! The client reports lifecycle and traffic through an injected
//! [`EventObserver`]. The default, [`TracingObserver`], forwards to `tracing`.

use tracing::{debug, info, warn};

/// Something the client did or saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// About to open the socket
    Connecting { addr: String },
    /// Socket open, streams bound
    Connected { addr: String },
    /// Connection released by `disconnect()` or drop
    Disconnected { addr: String },
    /// Command written, waiting for the reply
    Request { payload: String },
    /// Reply received
    Response { payload: String },
    /// Connection dropped after a failed or interrupted exchange
    Released { addr: String, reason: String },
}

pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &ClientEvent);
}

impl<F> EventObserver for F
where
    F: Fn(&ClientEvent) + Send + Sync,
{
    fn on_event(&self, event: &ClientEvent) {
        self(event)
    }
}

/// Logs events: lifecycle at info, traffic at debug, releases at warn
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Connecting { addr } => info!("Connecting client ({})", addr),
            ClientEvent::Connected { addr } => info!("Connected to OpenOCD Tcl RPC ({})", addr),
            ClientEvent::Disconnected { addr } => info!("Disconnected client ({})", addr),
            ClientEvent::Request { payload } => debug!("Sending: {}", payload),
            ClientEvent::Response { payload } => debug!("Response: {}", payload),
            ClientEvent::Released { addr, reason } => {
                warn!("Released connection to {}: {}", addr, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer = move |event: &ClientEvent| sink.lock().unwrap().push(event.clone());

        observer.on_event(&ClientEvent::Request { payload: "halt".into() });
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ClientEvent::Request { payload: "halt".into() }]
        );
    }

    #[test]
    fn test_tracing_observer_accepts_every_event() {
        let events = [
            ClientEvent::Connecting { addr: "localhost:6666".into() },
            ClientEvent::Connected { addr: "localhost:6666".into() },
            ClientEvent::Request { payload: "reg pc".into() },
            ClientEvent::Response { payload: "pc (/32): 0x08000000".into() },
            ClientEvent::Released { addr: "localhost:6666".into(), reason: "reset".into() },
            ClientEvent::Disconnected { addr: "localhost:6666".into() },
        ];
        for event in &events {
            TracingObserver.on_event(event);
        }
    }
}
