//! Instrumentation sinks. Purely observational: a run behaves the same with
//! [`NoopHooks`] as with any other sink.

use std::fmt;
use std::time::Instant;

use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

pub trait Hooks {
    fn region_begin(&mut self, name: &str);
    fn region_end(&mut self);
    fn set_attr(&mut self, key: &str, value: AttrValue);

    /// Runs `f` inside a region named `name`.
    fn region<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> T) -> T
    where
        Self: Sized,
    {
        self.region_begin(name);
        let result = f(self);
        self.region_end();
        result
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl Hooks for NoopHooks {
    fn region_begin(&mut self, _name: &str) {}
    fn region_end(&mut self) {}
    fn set_attr(&mut self, _key: &str, _value: AttrValue) {}
}

/// Reports region timings and attribute changes as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingHooks {
    open: Vec<(String, Instant)>,
}

impl TracingHooks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hooks for TracingHooks {
    fn region_begin(&mut self, name: &str) {
        self.open.push((name.to_string(), Instant::now()));
    }

    fn region_end(&mut self) {
        if let Some((name, start)) = self.open.pop() {
            let elapsed = start.elapsed();
            info!(region = %name, seconds = elapsed.as_secs_f64(), "{}: {:?}", name, elapsed);
        }
    }

    fn set_attr(&mut self, key: &str, value: AttrValue) {
        info!(attr = key, value = %value, "{} = {}", key, value);
    }
}
