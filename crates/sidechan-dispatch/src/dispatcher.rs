use std::fmt;
use std::sync::Arc;

use sidechan_frame::{parse_chunk, Message, MessageKind};
use tokio::runtime::Handle;

use crate::config::DispatchConfig;
use crate::output::{DebugSink, GuardedOutput, NullOutput, Output};
use crate::registry::HandlerRegistry;
use crate::scheduler::TerminationScheduler;
use crate::status::Status;

/// Callback receiving the raw message of a fatal dependency error.
pub type MissingDependencyHook = Arc<dyn Fn(&Message) + Send + Sync>;

/// What the dispatcher did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// An embedder handler took the message.
    Delegated,
    /// `end`: the child finished its response.
    ServiceEnded,
    /// `log`: entry forwarded to the debug sink.
    Logged,
    /// Fatal dependency error: text written and output ended.
    FatalEnded,
    /// Generic error: text written, termination armed.
    ErrorForwarded,
    /// Error observed but the output was already ended or absent.
    ErrorSuppressed,
}

/// Routes messages of one invocation to handlers or built-in policy.
pub struct Dispatcher {
    registry: HandlerRegistry,
    status: Arc<Status>,
    output: Option<Arc<dyn Output>>,
    debug: Arc<dyn DebugSink>,
    config: DispatchConfig,
    scheduler: TerminationScheduler,
    missing_dependency: Option<MissingDependencyHook>,
}

impl Dispatcher {
    /// Create a dispatcher with default configuration and no handlers.
    ///
    /// Termination timers run on the tokio runtime current at construction,
    /// or at arm time if there was none.
    pub fn new(
        status: Arc<Status>,
        output: Option<Arc<dyn Output>>,
        debug: Arc<dyn DebugSink>,
    ) -> Self {
        let config = DispatchConfig::default();
        let scheduler = TerminationScheduler::new(config.quiet_window, config.termination);
        Self {
            registry: HandlerRegistry::new(),
            status,
            output,
            debug,
            config,
            scheduler,
            missing_dependency: None,
        }
    }

    /// Replace the handler registry.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the dispatch configuration.
    ///
    /// Keeps the runtime the termination timers were bound to.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.scheduler = TerminationScheduler::with_runtime(
            config.quiet_window,
            config.termination,
            self.scheduler.runtime().cloned(),
        );
        self.config = config;
        self
    }

    /// Run termination timers on an explicit runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.scheduler = TerminationScheduler::with_runtime(
            self.config.quiet_window,
            self.config.termination,
            Some(runtime),
        );
        self
    }

    /// Observe fatal dependency errors, e.g. to trigger a package install.
    pub fn on_missing_dependency(mut self, hook: MissingDependencyHook) -> Self {
        self.missing_dependency = Some(hook);
        self
    }

    pub fn status(&self) -> &Arc<Status> {
        &self.status
    }

    pub fn scheduler(&self) -> &TerminationScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Parse one delivered chunk and dispatch its messages in order.
    ///
    /// Returns the number of messages dispatched.
    pub fn feed(&self, chunk: &[u8]) -> usize {
        let messages = parse_chunk(chunk);
        let count = messages.len();
        for message in messages {
            self.dispatch(message);
        }
        count
    }

    /// Apply handlers or built-in policy to one message.
    pub fn dispatch(&self, message: Message) -> Disposition {
        if let Some(handler) = message.type_name().and_then(|name| self.registry.get(name)) {
            tracing::debug!(msg_type = message.type_name(), "delegating to handler");
            let inner: &dyn Output = match &self.output {
                Some(output) => output.as_ref(),
                None => &NullOutput,
            };
            handler.handle(&message, &GuardedOutput::new(inner, &self.status));
            return Disposition::Delegated;
        }

        match message.kind() {
            MessageKind::End => {
                tracing::debug!("child signalled end");
                self.status.mark_service_ended();
                Disposition::ServiceEnded
            }
            MessageKind::Log => {
                self.debug.debug(message.entry());
                Disposition::Logged
            }
            kind => self.handle_error(kind, &message),
        }
    }

    /// Normal-path completion: end the output unless something already did.
    ///
    /// Returns true if this call ended the output.
    pub fn finish(&self) -> bool {
        if !self.status.try_end() {
            return false;
        }
        if let Some(output) = &self.output {
            output.end();
        }
        true
    }

    fn handle_error(&self, kind: MessageKind, message: &Message) -> Disposition {
        self.status.mark_erroring();

        if self.config.is_fatal_code(message.code()) {
            tracing::warn!(
                code = message.code(),
                error = %message.error_text(),
                "child is missing a dependency"
            );
            if let Some(hook) = &self.missing_dependency {
                hook(message);
            }
            if !self.status.try_end() {
                return Disposition::ErrorSuppressed;
            }
            if let Some(output) = &self.output {
                output.write(&message.error_text());
                output.end();
            }
            return Disposition::FatalEnded;
        }

        match &self.output {
            Some(output) if !self.status.ended() => {
                tracing::debug!(kind = kind.as_str(), "forwarding error, arming termination");
                output.write(&message.error_text());
                self.scheduler.arm(Arc::clone(&self.status), Arc::clone(output));
                Disposition::ErrorForwarded
            }
            _ => {
                tracing::trace!(kind = kind.as_str(), "error after output ended");
                Disposition::ErrorSuppressed
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("status", &self.status)
            .field("has_output", &self.output.is_some())
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
