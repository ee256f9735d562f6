//! Optional modules loaded by name
//!
//! Modules are registered with a factory and instantiated on first use. The
//! registry hands out typed access through `Any` downcasting.

pub mod example;
pub mod readcsv;

use std::any::Any;

use crate::logging::Log;

pub use example::Example;
pub use readcsv::{ColumnKey, CsvRecord, ReadCsv};

/// A loadable module
pub trait Module: Any {
    /// Registry name of the module
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builds a module instance; the log receives anything reported at load time
pub type ModuleFactory = fn(&mut dyn Log) -> Box<dyn Module>;

/// Known and loaded modules
#[derive(Default)]
pub struct ModuleRegistry {
    factories: Vec<(String, ModuleFactory)>,
    loaded: Vec<(String, Box<dyn Module>)>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled modules registered
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(example::NAME, Example::load);
        registry.register(readcsv::NAME, ReadCsv::load);
        registry
    }

    /// Register a factory; re-registering a name replaces the factory
    pub fn register(&mut self, name: &str, factory: ModuleFactory) {
        let name = name.to_lowercase();
        tracing::debug!("Registering module {}", name);
        match self.factories.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = factory,
            None => self.factories.push((name, factory)),
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.factories.iter().any(|(n, _)| *n == name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.loaded.iter().any(|(n, _)| *n == name)
    }

    /// Load a module by name
    ///
    /// Loading twice is harmless. An unknown name is a fatal error.
    pub fn load<L: Log>(&mut self, log: &mut L, name: &str) {
        let name = name.to_lowercase();
        if self.is_loaded(&name) {
            log.debug(format!("Modules: Module '{}' already loaded", name));
            return;
        }
        let Some(factory) = self
            .factories
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, factory)| *factory)
        else {
            let known: Vec<&str> = self.factories.iter().map(|(n, _)| n.as_str()).collect();
            log.error(vec![
                format!("Modules: An error occurred when trying to load module '{}'.", name),
                "The module is not registered.".to_string(),
                format!("Available modules: {}", known.join(", ")),
            ]);
        };
        log.debug(format!("Modules: Loading module '{}'", name));
        let module = factory(log);
        self.loaded.push((name, module));
    }

    /// Get a loaded module, loading it first when needed
    ///
    /// Returns `None` when the module is not of type `T`.
    pub fn get<T: Module, L: Log>(&mut self, log: &mut L, name: &str) -> Option<&mut T> {
        self.load(log, name);
        let name = name.to_lowercase();
        self.loaded
            .iter_mut()
            .find(|(n, _)| *n == name)
            .and_then(|(_, module)| module.as_any_mut().downcast_mut::<T>())
    }

    /// Names of loaded modules, in load order
    pub fn loaded(&self) -> Vec<&str> {
        self.loaded.iter().map(|(n, _)| n.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Content, Severity};
    use crate::testing::captured_log;
    use std::panic::{self, AssertUnwindSafe};

    struct Counter {
        hits: u32,
    }

    impl Module for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn counter(log: &mut dyn Log) -> Box<dyn Module> {
        log.add(Content::from("counter ready"), Severity::Notice);
        Box::new(Counter { hits: 0 })
    }

    #[test]
    fn test_load_and_get() {
        let (mut log, _writer) = captured_log();
        let mut registry = ModuleRegistry::new();
        registry.register("Counter", counter);
        assert!(registry.is_registered("counter"));
        assert!(!registry.is_loaded("counter"));

        registry.get::<Counter, _>(&mut log, "COUNTER").unwrap().hits += 1;
        registry.get::<Counter, _>(&mut log, "counter").unwrap().hits += 1;

        assert!(registry.is_loaded("counter"));
        assert_eq!(registry.get::<Counter, _>(&mut log, "counter").unwrap().hits, 2);
        assert_eq!(registry.loaded(), vec!["counter"]);

        // Only the first load runs the factory
        let notices = log
            .records()
            .iter()
            .filter(|r| r.severity() == Severity::Notice)
            .count();
        assert_eq!(notices, 1);
    }

    #[test]
    fn test_load_twice_logs_debug() {
        let (mut log, _writer) = captured_log();
        log.set_max_size(100);
        let mut registry = ModuleRegistry::new();
        registry.register("counter", counter);
        registry.load(&mut log, "counter");
        registry.load(&mut log, "counter");

        let last = log.records().last().unwrap();
        assert_eq!(last.severity(), Severity::Debug);
        assert_eq!(last.lines()[0], "Modules: Module 'counter' already loaded");
    }

    #[test]
    fn test_wrong_type_is_none() {
        let (mut log, _writer) = captured_log();
        let mut registry = ModuleRegistry::new();
        registry.register("counter", counter);
        assert!(registry.get::<Example, _>(&mut log, "counter").is_none());
    }

    #[test]
    fn test_unknown_module_is_fatal() {
        let (mut log, writer) = captured_log();
        let mut registry = ModuleRegistry::with_builtin();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.load(&mut log, "missing");
        }));
        assert!(result.is_err());
        assert!(writer.contents().contains("Available modules: example, readcsv"));
    }

    #[test]
    fn test_builtin_modules() {
        let (mut log, writer) = captured_log();
        let mut registry = ModuleRegistry::with_builtin();
        assert!(registry.get::<ReadCsv, _>(&mut log, "readcsv").is_some());
        registry.load(&mut log, "example");
        log.flush();
        assert!(writer.contents().contains("Module 'Example' loaded"));
        assert_eq!(registry.loaded(), vec!["readcsv", "example"]);
    }
}
