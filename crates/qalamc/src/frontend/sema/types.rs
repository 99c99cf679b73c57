//! Type representation and the compatibility/promotion rules
//!
//! Every expression-typing decision of the analyzer goes through
//! [`TypeChecker`], so assignment checks, argument checks and operator
//! inference cannot drift apart.

use crate::frontend::ast::{BinaryOp, UnaryOp};
use std::collections::BTreeMap;
use std::fmt;

/// The five built-in types, pre-registered in the global scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Integer,
    Real,
    Boolean,
    Char,
    StringRef,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 5] = [
        PrimitiveType::Integer,
        PrimitiveType::Real,
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::StringRef,
    ];

    /// Source-level name of the built-in type
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Integer => "صحيح",
            PrimitiveType::Real => "حقيقي",
            PrimitiveType::Boolean => "منطقي",
            PrimitiveType::Char => "حرفي",
            PrimitiveType::StringRef => "خيط_رمزي",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Resolved data type
///
/// Equality is structural: lists compare element type names only (the size
/// is kept for code generation), records compare their field maps.
#[derive(Debug, Clone)]
pub enum TypeInfo {
    Primitive(PrimitiveType),
    List { element: String, size: usize },
    Record { fields: BTreeMap<String, TypeInfo> },
}

impl TypeInfo {
    pub fn integer() -> Self {
        TypeInfo::Primitive(PrimitiveType::Integer)
    }

    pub fn real() -> Self {
        TypeInfo::Primitive(PrimitiveType::Real)
    }

    pub fn boolean() -> Self {
        TypeInfo::Primitive(PrimitiveType::Boolean)
    }

    pub fn char() -> Self {
        TypeInfo::Primitive(PrimitiveType::Char)
    }

    pub fn string() -> Self {
        TypeInfo::Primitive(PrimitiveType::StringRef)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeInfo::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self, p: PrimitiveType) -> bool {
        self.as_primitive() == Some(p)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TypeInfo::List { .. })
    }

    pub fn is_record(&self) -> bool {
        matches!(self, TypeInfo::Record { .. })
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeInfo::Primitive(a), TypeInfo::Primitive(b)) => a == b,
            (TypeInfo::List { element: a, .. }, TypeInfo::List { element: b, .. }) => a == b,
            (TypeInfo::Record { fields: a }, TypeInfo::Record { fields: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeInfo {}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Primitive(p) => write!(f, "{}", p.name()),
            TypeInfo::List { element, size } => write!(f, "قائمة[{}] من {}", size, element),
            TypeInfo::Record { fields } => {
                write!(f, "سجل {{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Compatibility and result-type rules
pub struct TypeChecker;

impl TypeChecker {
    /// `source` may be stored into `target`: equal types, or Integer into Real
    pub fn are_compatible(source: &TypeInfo, target: &TypeInfo) -> bool {
        source == target
            || (source.is_primitive(PrimitiveType::Integer)
                && target.is_primitive(PrimitiveType::Real))
    }

    pub fn is_numeric(ty: &TypeInfo) -> bool {
        matches!(
            ty.as_primitive(),
            Some(PrimitiveType::Integer | PrimitiveType::Real)
        )
    }

    pub fn is_boolean(ty: &TypeInfo) -> bool {
        ty.is_primitive(PrimitiveType::Boolean)
    }

    /// Result type of a binary operation, `None` if the operands do not fit
    pub fn result_type(op: BinaryOp, left: &TypeInfo, right: &TypeInfo) -> Option<TypeInfo> {
        if op.is_arithmetic() {
            if !Self::is_numeric(left) || !Self::is_numeric(right) {
                return None;
            }
            let real = left.is_primitive(PrimitiveType::Real)
                || right.is_primitive(PrimitiveType::Real);
            Some(if real { TypeInfo::real() } else { TypeInfo::integer() })
        } else if op.is_relational() {
            if Self::are_compatible(left, right) || Self::are_compatible(right, left) {
                Some(TypeInfo::boolean())
            } else {
                None
            }
        } else if Self::is_boolean(left) && Self::is_boolean(right) {
            Some(TypeInfo::boolean())
        } else {
            None
        }
    }

    /// Result type of a unary operation, `None` if the operand does not fit
    pub fn unary_result_type(op: UnaryOp, operand: &TypeInfo) -> Option<TypeInfo> {
        match op {
            UnaryOp::Plus | UnaryOp::Minus if Self::is_numeric(operand) => Some(operand.clone()),
            UnaryOp::Not if Self::is_boolean(operand) => Some(TypeInfo::boolean()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prim(p: PrimitiveType) -> TypeInfo {
        TypeInfo::Primitive(p)
    }

    #[test]
    fn test_primitive_compatibility_matrix() {
        for a in PrimitiveType::ALL {
            for b in PrimitiveType::ALL {
                let expected = a == b
                    || (a == PrimitiveType::Integer && b == PrimitiveType::Real);
                assert_eq!(
                    TypeChecker::are_compatible(&prim(a), &prim(b)),
                    expected,
                    "{:?} -> {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_real_does_not_narrow_to_integer() {
        assert!(TypeChecker::are_compatible(&TypeInfo::integer(), &TypeInfo::real()));
        assert!(!TypeChecker::are_compatible(&TypeInfo::real(), &TypeInfo::integer()));
        assert!(!TypeChecker::are_compatible(&TypeInfo::char(), &TypeInfo::string()));
    }

    #[test]
    fn test_list_equality_ignores_size() {
        let a = TypeInfo::List { element: "صحيح".into(), size: 5 };
        let b = TypeInfo::List { element: "صحيح".into(), size: 10 };
        let c = TypeInfo::List { element: "حقيقي".into(), size: 5 };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(TypeChecker::are_compatible(&a, &b));
    }

    #[test]
    fn test_record_equality_is_structural() {
        let mut fields = BTreeMap::new();
        fields.insert("س".to_string(), TypeInfo::integer());
        fields.insert("ص".to_string(), TypeInfo::real());
        let a = TypeInfo::Record { fields: fields.clone() };
        let b = TypeInfo::Record { fields: fields.clone() };
        fields.insert("ع".to_string(), TypeInfo::boolean());
        let c = TypeInfo::Record { fields };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, TypeInfo::List { element: "صحيح".into(), size: 1 });
    }

    #[test]
    fn test_arithmetic_promotion() {
        let arithmetic = [
            BinaryOp::Add,
            BinaryOp::Sub,
            BinaryOp::Mul,
            BinaryOp::Div,
            BinaryOp::IntDiv,
            BinaryOp::Mod,
        ];
        let numeric = [PrimitiveType::Integer, PrimitiveType::Real];
        for op in arithmetic {
            for a in numeric {
                for b in numeric {
                    let expected = if a == PrimitiveType::Real || b == PrimitiveType::Real {
                        TypeInfo::real()
                    } else {
                        TypeInfo::integer()
                    };
                    assert_eq!(TypeChecker::result_type(op, &prim(a), &prim(b)), Some(expected));
                }
            }
            for other in [PrimitiveType::Boolean, PrimitiveType::Char, PrimitiveType::StringRef] {
                assert_eq!(TypeChecker::result_type(op, &prim(other), &TypeInfo::integer()), None);
                assert_eq!(TypeChecker::result_type(op, &TypeInfo::real(), &prim(other)), None);
            }
        }
    }

    #[test]
    fn test_relational_requires_compatible_operands() {
        assert_eq!(
            TypeChecker::result_type(BinaryOp::Gt, &TypeInfo::integer(), &TypeInfo::real()),
            Some(TypeInfo::boolean())
        );
        assert_eq!(
            TypeChecker::result_type(BinaryOp::Lt, &TypeInfo::real(), &TypeInfo::integer()),
            Some(TypeInfo::boolean())
        );
        assert_eq!(
            TypeChecker::result_type(BinaryOp::Eq, &TypeInfo::string(), &TypeInfo::string()),
            Some(TypeInfo::boolean())
        );
        assert_eq!(
            TypeChecker::result_type(BinaryOp::Gt, &TypeInfo::string(), &TypeInfo::integer()),
            None
        );
    }

    #[test]
    fn test_logical_operators() {
        let b = TypeInfo::boolean();
        assert_eq!(TypeChecker::result_type(BinaryOp::And, &b, &b), Some(b.clone()));
        assert_eq!(TypeChecker::result_type(BinaryOp::Or, &b, &TypeInfo::integer()), None);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(
            TypeChecker::unary_result_type(UnaryOp::Minus, &TypeInfo::real()),
            Some(TypeInfo::real())
        );
        assert_eq!(TypeChecker::unary_result_type(UnaryOp::Plus, &TypeInfo::boolean()), None);
        assert_eq!(
            TypeChecker::unary_result_type(UnaryOp::Not, &TypeInfo::boolean()),
            Some(TypeInfo::boolean())
        );
        assert_eq!(TypeChecker::unary_result_type(UnaryOp::Not, &TypeInfo::integer()), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TypeInfo::string().to_string(), "خيط_رمزي");
        assert_eq!(
            TypeInfo::List { element: "صحيح".into(), size: 3 }.to_string(),
            "قائمة[3] من صحيح"
        );
        assert_eq!(PrimitiveType::from_name("منطقي"), Some(PrimitiveType::Boolean));
        assert_eq!(PrimitiveType::from_name("نص"), None);
    }
}
