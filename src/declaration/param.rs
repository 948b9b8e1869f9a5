use crate::transform::Operator;
use serde::{Deserialize, Serialize};

/// Declared parameter name, operator and flatten flag.
///
/// Used on operation arguments and on filter members alike. With `flatten`
/// set, the value is a nested filter whose members become parameters
/// prefixed with the capitalized `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub flatten: bool,
}

impl ParamDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            operator: Operator::Equal,
            flatten: false,
        }
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn flatten(mut self) -> Self {
        self.flatten = true;
        self
    }
}
