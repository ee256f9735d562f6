//! Minimal module that announces itself when loaded

use std::any::Any;

use super::Module;
use crate::logging::{Content, Log, Severity};

pub const NAME: &str = "example";

#[derive(Debug, Default)]
pub struct Example;

impl Example {
    pub fn load(log: &mut dyn Log) -> Box<dyn Module> {
        log.add(Content::from("Module 'Example' loaded"), Severity::Print);
        Box::new(Example)
    }
}

impl Module for Example {
    fn name(&self) -> &str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
