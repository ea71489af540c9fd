//! Column type tags and schema metadata

use serde::{Deserialize, Serialize};

/// The primitive kind stored by a column, without nullability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Int,
    Float,
    String,
    Char,
    Bool,
}

impl DataKind {
    /// Numeric kinds support ordering comparisons and arithmetic statistics
    pub fn is_numeric(self) -> bool {
        matches!(self, DataKind::Int | DataKind::Float)
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKind::Int => write!(f, "int32"),
            DataKind::Float => write!(f, "float32"),
            DataKind::String => write!(f, "string"),
            DataKind::Char => write!(f, "char"),
            DataKind::Bool => write!(f, "bool"),
        }
    }
}

/// Concrete storage type of a column: a kind crossed with a nullable flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Int32,
    Float32,
    Utf8,
    Char,
    Bool,
    NullableInt32,
    NullableFloat32,
    NullableUtf8,
    NullableChar,
    NullableBool,
}

impl TypeTag {
    /// Every concrete tag, non-nullable first
    pub const ALL: [TypeTag; 10] = [
        TypeTag::Int32,
        TypeTag::Float32,
        TypeTag::Utf8,
        TypeTag::Char,
        TypeTag::Bool,
        TypeTag::NullableInt32,
        TypeTag::NullableFloat32,
        TypeTag::NullableUtf8,
        TypeTag::NullableChar,
        TypeTag::NullableBool,
    ];

    /// Build a tag from a kind and a nullable flag
    pub fn new(kind: DataKind, nullable: bool) -> Self {
        match (kind, nullable) {
            (DataKind::Int, false) => TypeTag::Int32,
            (DataKind::Float, false) => TypeTag::Float32,
            (DataKind::String, false) => TypeTag::Utf8,
            (DataKind::Char, false) => TypeTag::Char,
            (DataKind::Bool, false) => TypeTag::Bool,
            (DataKind::Int, true) => TypeTag::NullableInt32,
            (DataKind::Float, true) => TypeTag::NullableFloat32,
            (DataKind::String, true) => TypeTag::NullableUtf8,
            (DataKind::Char, true) => TypeTag::NullableChar,
            (DataKind::Bool, true) => TypeTag::NullableBool,
        }
    }

    pub fn kind(self) -> DataKind {
        match self {
            TypeTag::Int32 | TypeTag::NullableInt32 => DataKind::Int,
            TypeTag::Float32 | TypeTag::NullableFloat32 => DataKind::Float,
            TypeTag::Utf8 | TypeTag::NullableUtf8 => DataKind::String,
            TypeTag::Char | TypeTag::NullableChar => DataKind::Char,
            TypeTag::Bool | TypeTag::NullableBool => DataKind::Bool,
        }
    }

    pub fn is_nullable(self) -> bool {
        matches!(
            self,
            TypeTag::NullableInt32
                | TypeTag::NullableFloat32
                | TypeTag::NullableUtf8
                | TypeTag::NullableChar
                | TypeTag::NullableBool
        )
    }

    /// The nullable counterpart of this tag
    pub fn to_nullable(self) -> Self {
        TypeTag::new(self.kind(), true)
    }

    pub fn is_numeric(self) -> bool {
        self.kind().is_numeric()
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nullable() {
            write!(f, "{}?", self.kind())
        } else {
            write!(f, "{}", self.kind())
        }
    }
}

/// Name and type of one column, detached from its data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name (from header)
    pub name: String,
    /// Storage type
    pub tag: TypeTag,
}

impl Field {
    pub fn new(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }
}
