//! Persisted async method information.
//!
//! [`crate::metadata::customdebuginformation::CustomDebugInfo::AsyncMethodSteppingInfo`]
//! is a transient wire record; what debuggers actually consume is one [`AsyncMethod`]
//! per state machine, built after the records of its `MoveNext` method have been
//! decoded. The fold lives here so the wire codec stays free of symbol-store policy.

use crate::metadata::{
    customdebuginformation::types::{AsyncStep, CustomDebugInfo, MethodRef},
    method::InstrRef,
};

/// The async view of one state machine method.
///
/// Holds the kickoff method the state machine was generated from, the catch handler
/// the machine funnels exceptions through, and the yield and resume point of every
/// await expression in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncMethod {
    /// The user-visible method the state machine was generated from
    pub kickoff: MethodRef,
    /// The catch handler instruction, absent for async void methods
    pub catch_handler: Option<InstrRef>,
    /// One step per await expression, in source order
    pub steps: Vec<AsyncStep>,
}

impl AsyncMethod {
    /// Creates an empty async view with no catch handler and no steps.
    #[must_use]
    pub fn new(kickoff: MethodRef) -> Self {
        AsyncMethod {
            kickoff,
            catch_handler: None,
            steps: Vec::new(),
        }
    }

    /// Folds the decoded records of one state machine method into an async view.
    ///
    /// Records other than stepping info are ignored. When more than one stepping
    /// record is present their steps concatenate in record order and the first
    /// recorded catch handler wins.
    ///
    /// # Arguments
    /// * `kickoff` - The method the state machine was generated from
    /// * `infos` - The decoded records of the state machine's `MoveNext` method
    #[must_use]
    pub fn fold(kickoff: MethodRef, infos: &[CustomDebugInfo]) -> Self {
        let mut folded = AsyncMethod::new(kickoff);

        for info in infos {
            if let CustomDebugInfo::AsyncMethodSteppingInfo {
                catch_handler,
                steps,
            } = info
            {
                if folded.catch_handler.is_none() {
                    folded.catch_handler = *catch_handler;
                }
                folded.steps.extend(steps.iter().cloned());
            }
        }

        folded
    }

    /// Returns true if any stepping information was recorded.
    ///
    /// A method whose records carry no stepping info folds into an empty view;
    /// such a method is not an async state machine.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.catch_handler.is_some() || !self.steps.is_empty()
    }

    /// Converts the view back into the wire record it was folded from.
    #[must_use]
    pub fn to_stepping_info(&self) -> CustomDebugInfo {
        CustomDebugInfo::AsyncMethodSteppingInfo {
            catch_handler: self.catch_handler,
            steps: self.steps.clone(),
        }
    }
}
