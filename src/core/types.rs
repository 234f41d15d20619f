use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    F16,
    I32,
    I64,
    U8,
    Bool,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::F32 => "f32",
            DataType::F16 => "f16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Dim {
    Static(usize),
    Symbol(String),
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Static(v) => write!(f, "{}", v),
            Dim::Symbol(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct Shape {
    pub dims: Vec<Dim>,
}

impl Shape {
    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    pub fn from_static(dims: &[usize]) -> Self {
        Self { dims: dims.iter().map(|&d| Dim::Static(d)).collect() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// `None` while any dimension is still symbolic.
    pub fn num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, d| match d {
            Dim::Static(v) => Some(acc * v),
            Dim::Symbol(_) => None,
        })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.dims.iter().map(|d| d.to_string()).collect::<Vec<_>>();
        write!(f, "[{}]", dims.join(", "))
    }
}

/// Source-side tensor metadata handed to the backend when it allocates a target tensor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub shape: Shape,
    pub dtype: DataType,
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.dtype, self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_elements_of_static_shape() {
        assert_eq!(Shape::from_static(&[2, 3, 4]).num_elements(), Some(24));
        assert_eq!(Shape::default().num_elements(), Some(1));
    }

    #[test]
    fn symbolic_dims_have_no_element_count() {
        let shape = Shape::new(vec![Dim::Symbol("N".into()), Dim::Static(8)]);
        assert_eq!(shape.rank(), 2);
        assert_eq!(shape.num_elements(), None);
        assert_eq!(shape.to_string(), "[N, 8]");
    }

    #[test]
    fn dims_deserialize_untagged() {
        let shape: Shape = serde_json::from_str(r#"[1, "N", 16]"#).unwrap();
        assert_eq!(shape.dims, vec![Dim::Static(1), Dim::Symbol("N".into()), Dim::Static(16)]);
    }
}
