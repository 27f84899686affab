//! Remote call declarations and argument resolution.

use crate::attributes::AttributeDescriptor;
use crate::types::{RpcTarget, ValueType};
use serde::{Deserialize, Serialize};

/// An attribute offered as an argument of a remote call.
///
/// `included` is the designer's selection; it is kept by name across passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub included: bool,
}

/// A remote call declared on a networked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCall {
    pub name: String,
    #[serde(default)]
    pub target: RpcTarget,
    #[serde(default)]
    pub reliable: bool,
    #[serde(default)]
    pub simulated: bool,
    /// Recomputed from the attribute registry every pass.
    #[serde(default)]
    pub arguments: Vec<ArgumentDescriptor>,
}

impl RpcCall {
    pub fn new(name: impl Into<String>, target: RpcTarget) -> Self {
        Self {
            name: name.into(),
            target,
            reliable: false,
            simulated: false,
            arguments: Vec::new(),
        }
    }

    /// Selects or deselects an argument. Returns false if the attribute is
    /// not currently an eligible argument.
    pub fn set_argument_included(&mut self, name: &str, included: bool) -> bool {
        match self.arguments.iter_mut().find(|a| a.name == name) {
            Some(argument) => {
                argument.included = included;
                true
            }
            None => false,
        }
    }

    /// Arguments selected for the wire, in registry order.
    pub fn included_arguments(&self) -> impl Iterator<Item = &ArgumentDescriptor> {
        self.arguments.iter().filter(|a| a.included)
    }
}

/// Whether `attribute` may be passed as an argument of `call`.
///
/// A replicated value already reaches its observers, except that a
/// server-bound call must carry values whose replication skips the owner.
pub fn is_eligible_argument(call: &RpcCall, attribute: &AttributeDescriptor) -> bool {
    if attribute.replicate {
        return call.target == RpcTarget::Server && !attribute.replicate_for_owner;
    }

    true
}

/// Eligible attributes of `call`, in registry order.
pub fn eligible_arguments<'a>(
    call: &RpcCall,
    attributes: &'a [AttributeDescriptor],
) -> Vec<&'a AttributeDescriptor> {
    attributes
        .iter()
        .filter(|attribute| is_eligible_argument(call, attribute))
        .collect()
}

/// Rebuilds the argument list of `call` from the registry, keeping the
/// selection of arguments that stay eligible.
pub fn resolve_arguments(call: &mut RpcCall, attributes: &[AttributeDescriptor]) {
    let resolved = eligible_arguments(call, attributes)
        .into_iter()
        .map(|attribute| {
            let included = call
                .arguments
                .iter()
                .find(|a| a.name == attribute.name)
                .map(|a| a.included)
                .unwrap_or(false);

            ArgumentDescriptor {
                name: attribute.name.clone(),
                value_type: attribute.value_type,
                included,
            }
        })
        .collect();

    call.arguments = resolved;
}
