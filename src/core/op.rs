use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OpKind {
    // Unary
    Abs, Neg, Sqrt, Exp, Log, Tanh, Logistic, Relu,
    // Binary
    Add, Sub, Mul, Div, Min, Max, Pow,
    // Special
    Softmax { beta: f32 },
    Reshape { new_shape: Vec<i64> },
    Transpose { permutation: Vec<usize> },
    FullyConnected { keep_num_dims: bool },
    Custom { op_type: String },
}

/// Operator-specific parameter value carried by a target node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Float(f32),
    Ints(Vec<i64>),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Ints(v) => write!(f, "{:?}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl OpKind {
    pub fn from_json(name: &str, params: &serde_json::Value) -> anyhow::Result<Self> {
        match name {
            "Abs" => Ok(OpKind::Abs),
            "Neg" => Ok(OpKind::Neg),
            "Sqrt" => Ok(OpKind::Sqrt),
            "Exp" => Ok(OpKind::Exp),
            "Log" => Ok(OpKind::Log),
            "Tanh" => Ok(OpKind::Tanh),
            "Logistic" => Ok(OpKind::Logistic),
            "Relu" => Ok(OpKind::Relu),
            "Add" => Ok(OpKind::Add),
            "Sub" => Ok(OpKind::Sub),
            "Mul" => Ok(OpKind::Mul),
            "Div" => Ok(OpKind::Div),
            "Min" => Ok(OpKind::Min),
            "Max" => Ok(OpKind::Max),
            "Pow" => Ok(OpKind::Pow),
            "Softmax" => {
                let beta = match params.get("beta") {
                    None => 1.0,
                    Some(v) => v.as_f64()
                        .ok_or_else(|| anyhow::anyhow!("Softmax 'beta' must be a number, got {}", v))?
                        as f32,
                };
                Ok(OpKind::Softmax { beta })
            }
            "Reshape" => {
                let new_shape: Vec<i64> = serde_json::from_value(params.get("new_shape").cloned().unwrap_or_default())?;
                Ok(OpKind::Reshape { new_shape })
            }
            "Transpose" => {
                let permutation: Vec<usize> = serde_json::from_value(params.get("permutation").cloned().unwrap_or_default())?;
                Ok(OpKind::Transpose { permutation })
            }
            "FullyConnected" => {
                let keep_num_dims = match params.get("keep_num_dims") {
                    None => false,
                    Some(v) => v.as_bool()
                        .ok_or_else(|| anyhow::anyhow!("FullyConnected 'keep_num_dims' must be a bool, got {}", v))?,
                };
                Ok(OpKind::FullyConnected { keep_num_dims })
            }
            "Custom" => {
                let op_type = params.get("op_type").and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow::anyhow!("Custom op is missing 'op_type'"))?
                    .to_string();
                Ok(OpKind::Custom { op_type })
            }
            _ => Err(anyhow::anyhow!("Unknown op: {}", name)),
        }
    }

    /// Operator type name as the target backend spells it.
    pub fn target_op_type(&self) -> &str {
        match self {
            OpKind::Abs => "ElementWiseAbs",
            OpKind::Neg => "ElementWiseNeg",
            OpKind::Sqrt => "ElementWiseSquareRoot",
            OpKind::Exp => "ElementWiseExp",
            OpKind::Log => "ElementWiseLog",
            OpKind::Tanh => "Tanh",
            OpKind::Logistic => "Sigmoid",
            OpKind::Relu => "Relu",
            OpKind::Add => "ElementWiseAdd",
            OpKind::Sub => "ElementWiseSubtract",
            OpKind::Mul => "ElementWiseMultiply",
            OpKind::Div => "ElementWiseDivide",
            OpKind::Min => "ElementWiseMinimum",
            OpKind::Max => "ElementWiseMaximum",
            OpKind::Pow => "ElementWisePower",
            OpKind::Softmax { .. } => "Softmax",
            OpKind::Reshape { .. } => "Reshape",
            OpKind::Transpose { .. } => "Transpose",
            OpKind::FullyConnected { .. } => "FullyConnected",
            OpKind::Custom { op_type } => op_type.as_str(),
        }
    }

    pub fn params(&self) -> Vec<(String, ParamValue)> {
        match self {
            OpKind::Softmax { beta } => vec![("beta".into(), ParamValue::Float(*beta))],
            OpKind::Reshape { new_shape } => vec![("new_shape".into(), ParamValue::Ints(new_shape.clone()))],
            OpKind::Transpose { permutation } => {
                let perm = permutation.iter().map(|&p| p as i64).collect();
                vec![("perm".into(), ParamValue::Ints(perm))]
            }
            OpKind::FullyConnected { keep_num_dims } => {
                vec![("keep_dims".into(), ParamValue::Bool(*keep_num_dims))]
            }
            _ => vec![],
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Softmax { .. } => f.write_str("Softmax"),
            OpKind::Reshape { .. } => f.write_str("Reshape"),
            OpKind::Transpose { .. } => f.write_str("Transpose"),
            OpKind::FullyConnected { .. } => f.write_str("FullyConnected"),
            OpKind::Custom { op_type } => write!(f, "Custom({})", op_type),
            other => write!(f, "{:?}", other),
        }
    }
}
