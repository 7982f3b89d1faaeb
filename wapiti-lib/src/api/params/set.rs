//! Ordered param declarations and their resolution into request frames.

use std::collections::HashSet;

use log::debug;

use super::Multiplicity;
use super::Param;
use super::RequestFrame;
use crate::error::ParamError;
use crate::error::ResolveError;
use crate::model::FieldValue;
use crate::model::FieldValues;

/// An immutable, ordered collection of [`Param`] declarations.
///
/// Built once per operation with [`ParamSet::builder`]. Wire names are unique
/// and at most one multi-value param is batched.
///
/// # Example
///
/// ```
/// use wapiti_lib::api::params::{Param, ParamSet};
/// use wapiti_lib::model::FieldValues;
///
/// let params = ParamSet::builder()
///     .field_prefix("in")
///     .param(Param::fixed("prop", "info"))
///     .param(Param::fixed("inprop", "protection"))
///     .param(Param::multi("titles").required().batched().unprefixed())
///     .build()
///     .unwrap();
///
/// let frames = params
///     .resolve(&FieldValues::new().set("titles", ["A", "B", "C"]), 2)
///     .unwrap();
/// assert_eq!(frames.len(), 2);
/// assert_eq!(frames[0].get("titles"), Some("A|B"));
/// assert_eq!(frames[1].get("titles"), Some("C"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSet {
    params: Vec<Param>,
}

impl ParamSet {
    /// Creates a new builder.
    pub fn builder() -> ParamSetBuilder {
        ParamSetBuilder::default()
    }

    /// Returns the declared params in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the param with the given logical name.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Returns the batched param, if one is declared.
    pub fn batched(&self) -> Option<&Param> {
        self.params.iter().find(|p| p.is_batched())
    }

    /// Checks caller values against the declarations without building frames.
    ///
    /// Fails on undeclared or static fields, on lists given to single-value
    /// fields, and on required fields with neither a value nor a default.
    pub fn validate(&self, values: &FieldValues) -> Result<(), ResolveError> {
        for (name, value) in values.iter() {
            let param = self
                .get(name)
                .filter(|p| !p.is_static())
                .ok_or_else(|| ResolveError::unexpected(name))?;

            if param.multiplicity() == Multiplicity::Single && value.is_multi() {
                return Err(ResolveError::invalid(
                    name,
                    "a list was given for a single-value field",
                ));
            }
        }

        for param in self.params.iter().filter(|p| p.is_required()) {
            if self.effective_value(param, values).is_none() {
                return Err(ResolveError::missing(param.name()));
            }
        }

        Ok(())
    }

    /// Resolves caller values into one frame per batch.
    ///
    /// Static and single-value params are copied into every frame. The
    /// batched multi-value param is split into chunks of at most
    /// `max_batch_size` items, one frame per chunk. An optional batched param
    /// with no items yields a single frame without it.
    pub fn resolve(
        &self,
        values: &FieldValues,
        max_batch_size: usize,
    ) -> Result<Vec<RequestFrame>, ResolveError> {
        self.validate(values)?;

        let mut base = RequestFrame::new();
        let mut batch: Option<(String, &Param, Vec<String>)> = None;

        for param in &self.params {
            let Some(value) = self.effective_value(param, values) else {
                continue;
            };
            let wire_name = param.wire_name();

            if param.is_batched() {
                // Placeholder keeps the param's position in every frame.
                base.set(wire_name.clone(), String::new());
                batch = Some((wire_name, param, value.clone().into_values()));
            } else {
                base.set(wire_name, param.encode(value));
            }
        }

        let frames = match batch {
            None => vec![base],
            Some((wire_name, param, items)) => items
                .chunks(max_batch_size.max(1))
                .map(|chunk| {
                    let mut frame = base.clone();
                    frame.set(wire_name.clone(), param.join_rule().join(chunk));
                    frame
                })
                .collect(),
        };

        debug!("resolved {} field(s) into {} frame(s)", values.len(), frames.len());
        Ok(frames)
    }

    /// Returns the value a param resolves to: the caller's, else the default.
    ///
    /// Empty lists count as absent.
    fn effective_value<'a>(
        &'a self,
        param: &'a Param,
        values: &'a FieldValues,
    ) -> Option<&'a FieldValue> {
        let supplied = if param.is_static() {
            None
        } else {
            values.get(param.name())
        };
        supplied
            .filter(|v| !v.is_empty())
            .or_else(|| param.value().filter(|v| !v.is_empty()))
    }
}

/// Builder for [`ParamSet`].
#[derive(Debug, Clone, Default)]
pub struct ParamSetBuilder {
    field_prefix: Option<String>,
    params: Vec<Param>,
}

impl ParamSetBuilder {
    /// Sets the prefix applied to single and multi params that declare none.
    pub fn field_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.field_prefix = Some(prefix.into());
        self
    }

    /// Appends a param.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Appends several params.
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    /// Validates the declarations and builds the set.
    pub fn build(self) -> Result<ParamSet, ParamError> {
        let mut params = self.params;
        if let Some(prefix) = &self.field_prefix {
            for param in &mut params {
                param.apply_field_prefix(prefix);
            }
        }

        let mut names = HashSet::new();
        let mut wire_names = HashSet::new();
        let mut batched: Option<&str> = None;

        for param in &params {
            if !names.insert(param.name()) {
                return Err(ParamError::DuplicateField {
                    name: param.name().to_string(),
                });
            }
            let wire_name = param.wire_name();
            if !wire_names.insert(wire_name.clone()) {
                return Err(ParamError::duplicate(wire_name));
            }
            if param.is_batched() {
                if param.multiplicity() != Multiplicity::Multi {
                    return Err(ParamError::NotBatchable {
                        name: param.name().to_string(),
                    });
                }
                if let Some(first) = batched {
                    return Err(ParamError::MultipleBatchedParameters {
                        first: first.to_string(),
                        second: param.name().to_string(),
                    });
                }
                batched = Some(param.name());
            }
        }

        Ok(ParamSet { params })
    }
}
