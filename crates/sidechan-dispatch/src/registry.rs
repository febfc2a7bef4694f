use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sidechan_frame::Message;

use crate::output::Output;

/// Embedder-supplied handling for one message type.
///
/// A registered handler fully replaces built-in policy for its type name,
/// including `end`, `log` and `error`.
pub trait Handler: Send + Sync {
    fn handle(&self, message: &Message, output: &dyn Output);
}

impl<F> Handler for F
where
    F: Fn(&Message, &dyn Output) + Send + Sync,
{
    fn handle(&self, message: &Message, output: &dyn Output) {
        self(message, output)
    }
}

/// Type-keyed table of handlers, consulted before built-in policy.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for a type name.
    pub fn register(&mut self, type_name: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(type_name.into(), Arc::new(handler));
    }

    /// Builder form of [`HandlerRegistry::register`].
    pub fn with(mut self, type_name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.register(type_name, handler);
        self
    }

    /// Look up the handler for a type name.
    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryOutput;

    #[test]
    fn registered_handler_is_found_by_type() {
        let registry = HandlerRegistry::new().with("writeHead", |_: &Message, _: &dyn Output| {});
        assert!(registry.contains("writeHead"));
        assert!(registry.get("end").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn handler_receives_message_and_output() {
        let registry =
            HandlerRegistry::new().with("write", |message: &Message, output: &dyn Output| {
                output.write(message.payload["text"].as_str().unwrap_or_default());
            });

        let output = MemoryOutput::new();
        let message = Message::new("write", serde_json::json!({ "text": "hi" }));
        registry.get("write").unwrap().handle(&message, &output);

        assert_eq!(output.written(), "hi");
    }

    #[test]
    fn register_replaces_existing_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register("x", |_: &Message, output: &dyn Output| output.write("first"));
        registry.register("x", |_: &Message, output: &dyn Output| output.write("second"));

        let output = MemoryOutput::new();
        registry
            .get("x")
            .unwrap()
            .handle(&Message::new("x", serde_json::Value::Null), &output);
        assert_eq!(output.written(), "second");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn debug_lists_type_names() {
        let registry = HandlerRegistry::new()
            .with("b", |_: &Message, _: &dyn Output| {})
            .with("a", |_: &Message, _: &dyn Output| {});
        assert_eq!(format!("{registry:?}"), r#"HandlerRegistry { types: ["a", "b"] }"#);
    }
}
