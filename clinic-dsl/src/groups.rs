//! Optional-group state machine
//!
//! Tracks where the parameter section is relative to bracketed optional
//! groups and the run of required parameters:
//!
//! ```text
//! Start --[--> BeforeGroupOpen --param--> InGroupBeforeRequired --param (depth 0)--> Required
//! Start --param--> Required --default--> Optional
//! Required / InGroupAfterRequired --[--> InGroupAfterRequired --]--> AfterGroupClose
//! ```
//!
//! Groups opened before the required run are recorded on the "after"
//! side; entering the required run tells the caller to move every
//! recorded parameter to the "before" side.

use std::fmt;

use crate::errors::{DslError, DslResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Start,
    BeforeGroupOpen,
    InGroupBeforeRequired,
    Required,
    Optional,
    InGroupAfterRequired,
    AfterGroupClose,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupState::Start => "START",
            GroupState::BeforeGroupOpen => "BEFORE_GROUP_OPEN",
            GroupState::InGroupBeforeRequired => "IN_GROUP_BEFORE_REQUIRED",
            GroupState::Required => "REQUIRED",
            GroupState::Optional => "OPTIONAL",
            GroupState::InGroupAfterRequired => "IN_GROUP_AFTER_REQUIRED",
            GroupState::AfterGroupClose => "AFTER_GROUP_CLOSE",
        })
    }
}

/// Outcome of admitting a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// The required run started with this parameter
    pub entered_required: bool,
}

#[derive(Debug, Clone)]
pub struct ParameterGroupState {
    state: GroupState,
    depth: usize,
}

impl Default for ParameterGroupState {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterGroupState {
    pub fn new() -> Self {
        Self {
            state: GroupState::Start,
            depth: 0,
        }
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    /// Current bracket nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Forget everything seen so far, used when an explicit receiver
    /// replaces the implicit one
    pub fn restart(&mut self) {
        self.state = GroupState::Start;
    }

    fn unsupported(function: &str, state: GroupState, tag: char) -> DslError {
        DslError::semantic(format!(
            "Function {:?} has an unsupported group configuration. (Unexpected state {}.{})",
            function, state, tag
        ))
    }

    fn to_required(&mut self) -> bool {
        if self.state == GroupState::Required {
            return false;
        }
        self.state = GroupState::Required;
        true
    }

    /// Admit a parameter. `needs_default_check` is false for parameters
    /// exempt from the default ordering rule (keyword-only, `*args`).
    pub fn admit_parameter(
        &mut self,
        function: &str,
        name: &str,
        has_default: bool,
        needs_default_check: bool,
    ) -> DslResult<Admission> {
        let mut entered_required = false;
        match self.state {
            GroupState::Start | GroupState::Required => entered_required = self.to_required(),
            GroupState::BeforeGroupOpen => self.state = GroupState::InGroupBeforeRequired,
            GroupState::InGroupBeforeRequired => {
                if self.depth == 0 {
                    entered_required = self.to_required();
                }
            }
            GroupState::InGroupAfterRequired | GroupState::Optional => {}
            state => return Err(Self::unsupported(function, state, 'a')),
        }

        if has_default {
            if self.state == GroupState::Required {
                self.state = GroupState::Optional;
            }
        } else if needs_default_check && self.state == GroupState::Optional {
            return Err(DslError::semantic(format!(
                "Can't have a parameter without a default ({:?}) after a parameter with a default!",
                name
            )));
        }
        Ok(Admission { entered_required })
    }

    pub fn open_group(&mut self, function: &str) -> DslResult<()> {
        self.state = match self.state {
            GroupState::Start | GroupState::BeforeGroupOpen => GroupState::BeforeGroupOpen,
            GroupState::Required | GroupState::InGroupAfterRequired => {
                GroupState::InGroupAfterRequired
            }
            state => return Err(Self::unsupported(function, state, 'b')),
        };
        self.depth += 1;
        Ok(())
    }

    /// Close the innermost group; `members` is the number of parameters
    /// recorded at the current depth
    pub fn close_group(&mut self, function: &str, members: usize) -> DslResult<()> {
        if self.depth == 0 {
            return Err(DslError::semantic(format!(
                "Function {:?} has a ']' without a matching '['.",
                function
            )));
        }
        if members == 0 {
            return Err(DslError::semantic(format!(
                "Function {:?} has an empty group. All groups must contain at least one parameter.",
                function
            )));
        }
        self.depth -= 1;
        self.state = match self.state {
            GroupState::BeforeGroupOpen | GroupState::InGroupBeforeRequired => {
                GroupState::InGroupBeforeRequired
            }
            GroupState::InGroupAfterRequired | GroupState::AfterGroupClose => {
                GroupState::AfterGroupClose
            }
            state => return Err(Self::unsupported(function, state, 'c')),
        };
        Ok(())
    }

    /// Whether a '/' may appear here
    pub fn check_slash(&self, function: &str) -> DslResult<()> {
        let allowed = matches!(
            self.state,
            GroupState::Required
                | GroupState::Optional
                | GroupState::AfterGroupClose
                | GroupState::InGroupBeforeRequired
        );
        if !allowed || self.depth > 0 {
            return Err(Self::unsupported(function, self.state, 'd'));
        }
        Ok(())
    }

    /// Checks run when the parameter section ends
    pub fn finish(&self, function: &str) -> DslResult<()> {
        if self.depth > 0 {
            return Err(DslError::semantic(format!(
                "Function {:?} has a '[' without a matching ']'.",
                function
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: &str = "f";

    #[test]
    fn test_plain_parameters_enter_required_once() {
        let mut groups = ParameterGroupState::new();
        assert!(groups.admit_parameter(F, "a", false, true).unwrap().entered_required);
        assert!(!groups.admit_parameter(F, "b", false, true).unwrap().entered_required);
        assert_eq!(groups.state(), GroupState::Required);
    }

    #[test]
    fn test_defaults_freeze_optional() {
        let mut groups = ParameterGroupState::new();
        groups.admit_parameter(F, "a", true, true).unwrap();
        assert_eq!(groups.state(), GroupState::Optional);
        let err = groups.admit_parameter(F, "b", false, true).unwrap_err();
        assert!(err.message().starts_with("Can't have a parameter without a default (\"b\")"));
        assert!(groups.admit_parameter(F, "c", false, false).is_ok());
    }

    #[test]
    fn test_group_before_required() {
        let mut groups = ParameterGroupState::new();
        groups.open_group(F).unwrap();
        assert_eq!(groups.state(), GroupState::BeforeGroupOpen);
        assert!(!groups.admit_parameter(F, "a", false, true).unwrap().entered_required);
        groups.close_group(F, 1).unwrap();
        assert_eq!(groups.state(), GroupState::InGroupBeforeRequired);
        assert!(groups.admit_parameter(F, "b", false, true).unwrap().entered_required);
        assert_eq!(groups.state(), GroupState::Required);
    }

    #[test]
    fn test_group_after_required() {
        let mut groups = ParameterGroupState::new();
        groups.admit_parameter(F, "a", false, true).unwrap();
        groups.open_group(F).unwrap();
        groups.admit_parameter(F, "b", false, true).unwrap();
        groups.open_group(F).unwrap();
        assert_eq!(groups.depth(), 2);
        groups.admit_parameter(F, "c", false, true).unwrap();
        groups.close_group(F, 1).unwrap();
        groups.close_group(F, 1).unwrap();
        assert_eq!(groups.state(), GroupState::AfterGroupClose);
        assert!(groups.admit_parameter(F, "d", false, true).is_err());
    }

    #[test]
    fn test_bracket_errors() {
        let mut groups = ParameterGroupState::new();
        let err = groups.close_group(F, 0).unwrap_err();
        assert_eq!(err.message(), "Function \"f\" has a ']' without a matching '['.");

        groups.open_group(F).unwrap();
        assert!(groups.close_group(F, 0).unwrap_err().message().contains("empty group"));
        assert!(groups.finish(F).is_err());

        let mut optional = ParameterGroupState::new();
        optional.admit_parameter(F, "a", true, true).unwrap();
        assert!(optional.open_group(F).is_err());
    }

    #[test]
    fn test_slash_placement() {
        let mut groups = ParameterGroupState::new();
        assert!(groups.check_slash(F).is_err());
        groups.admit_parameter(F, "a", false, true).unwrap();
        assert!(groups.check_slash(F).is_ok());
        groups.open_group(F).unwrap();
        assert!(groups.check_slash(F).is_err());
    }
}
