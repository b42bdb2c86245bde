//! Bound parameter access.

use std::collections::HashMap;

use shardline_sql::ast::Placeholder;

use crate::value::Value;

/// Read access to the parameters bound to one statement execution.
///
/// Ordinal 0 is the first `?` in source order.
pub trait ParameterSupplier {
    fn parameter_count(&self) -> usize;

    fn parameter(&self, ordinal: usize) -> Option<&Value>;

    fn named_parameter(&self, name: &str) -> Option<&Value>;

    /// Resolves a placeholder from the parsed statement.
    fn placeholder(&self, placeholder: &Placeholder) -> Option<&Value> {
        match placeholder {
            Placeholder::Positional(ordinal) => self.parameter(*ordinal),
            Placeholder::Named(name) => self.named_parameter(name),
        }
    }
}

/// Supplies nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParameters;

impl ParameterSupplier for NoParameters {
    fn parameter_count(&self) -> usize {
        0
    }

    fn parameter(&self, _ordinal: usize) -> Option<&Value> {
        None
    }

    fn named_parameter(&self, _name: &str) -> Option<&Value> {
        None
    }
}

/// Positional and named parameters held by value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    positional: Vec<Value>,
    named: HashMap<String, Value>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            named: HashMap::new(),
        }
    }

    /// Appends the next positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn bind_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    /// Replaces the positional parameters, keeping the named ones.
    #[must_use]
    pub fn with_positional(&self, values: Vec<Value>) -> Self {
        Self {
            positional: values,
            named: self.named.clone(),
        }
    }
}

impl ParameterSupplier for Parameters {
    fn parameter_count(&self) -> usize {
        self.positional.len()
    }

    fn parameter(&self, ordinal: usize) -> Option<&Value> {
        self.positional.get(ordinal)
    }

    fn named_parameter(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }
}

impl<P: ParameterSupplier + ?Sized> ParameterSupplier for &P {
    fn parameter_count(&self) -> usize {
        (**self).parameter_count()
    }

    fn parameter(&self, ordinal: usize) -> Option<&Value> {
        (**self).parameter(ordinal)
    }

    fn named_parameter(&self, name: &str) -> Option<&Value> {
        (**self).named_parameter(name)
    }
}
