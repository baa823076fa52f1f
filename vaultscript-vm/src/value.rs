use crate::error::Fault;

/// Reference into the externally-owned string/constant pool.
///
/// The VM never dereferences these; they are only compared and passed
/// through the host capability interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(pub u32);

/// Opaque reference into the host entity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// A single interpreter-level datum.
///
/// Values are copied by value on every push/pop. Handles are not owned by
/// the VM and carry no lifetime of their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Str(StringId),
    Object(ObjectId),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_int(&self) -> Result<i32, Fault> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(Fault::TypeMismatch {
                expected: "int",
                got: other.kind(),
            }),
        }
    }

    pub fn as_float(&self) -> Result<f32, Fault> {
        match self {
            Value::Float(v) => Ok(*v),
            other => Err(Fault::TypeMismatch {
                expected: "float",
                got: other.kind(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<StringId, Fault> {
        match self {
            Value::Str(v) => Ok(*v),
            other => Err(Fault::TypeMismatch {
                expected: "string",
                got: other.kind(),
            }),
        }
    }

    pub fn as_object(&self) -> Result<ObjectId, Fault> {
        match self {
            Value::Object(v) => Ok(*v),
            other => Err(Fault::TypeMismatch {
                expected: "object",
                got: other.kind(),
            }),
        }
    }

    /// Truthiness used by the conditional-jump and logical opcodes.
    /// Zero is false, everything else (handles included) is true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(_) | Value::Object(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accessors_round_trip() {
        assert_eq!(Value::Int(-7).as_int(), Ok(-7));
        assert_eq!(Value::Float(1.5).as_float(), Ok(1.5));
        assert_eq!(Value::Str(StringId(3)).as_str(), Ok(StringId(3)));
        assert_eq!(Value::Object(ObjectId(9)).as_object(), Ok(ObjectId(9)));
    }

    #[test]
    fn mismatched_accessor_faults() {
        assert_eq!(
            Value::Float(0.0).as_int(),
            Err(Fault::TypeMismatch {
                expected: "int",
                got: "float"
            })
        );
        assert_eq!(
            Value::Int(1).as_str(),
            Err(Fault::TypeMismatch {
                expected: "string",
                got: "int"
            })
        );
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(-1).truthy());
        assert!(!Value::Float(0.0).truthy());
        assert!(Value::Str(StringId(0)).truthy());
        assert!(Value::Object(ObjectId(0)).truthy());
    }
}
