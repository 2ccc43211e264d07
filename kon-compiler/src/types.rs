//! The static type model: primitives, collections, nominal structs and enums,
//! and function signatures, together with the compatibility rules and the
//! member tables for the built-in collection types.

use std::fmt;

#[derive(Debug, Clone)]
pub enum StaticType {
    Num,
    Str,
    Bool,
    Void,
    /// The type of anything that could not be resolved. Never compatible
    /// with any type, itself included.
    Unknown,
    /// The type of `[]`; compatible with every list type.
    EmptyList,
    List(Box<StaticType>),
    /// Keys are always `Str`, only the value type is tracked.
    Map(Box<StaticType>),
    Range,
    Struct(StructType),
    Enum(EnumType),
    Function(FunctionType),
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<(String, StaticType)>,
}

impl StructType {
    pub fn new(name: impl Into<String>, fields: Vec<(String, StaticType)>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&StaticType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, variants: Vec<String>) -> Self {
        Self {
            name: name.into(),
            variants,
        }
    }

    /// The zero-based index of a variant, i.e. its declaration position.
    pub fn index_of(&self, variant: &str) -> Option<usize> {
        self.variants.iter().position(|name| name == variant)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    pub parameters: Vec<(String, StaticType)>,
    pub return_type: Box<StaticType>,
}

impl FunctionType {
    pub fn new(parameters: Vec<(String, StaticType)>, return_type: StaticType) -> Self {
        Self {
            parameters,
            return_type: Box::new(return_type),
        }
    }
}

impl PartialEq for StaticType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StaticType::Num, StaticType::Num)
            | (StaticType::Str, StaticType::Str)
            | (StaticType::Bool, StaticType::Bool)
            | (StaticType::Void, StaticType::Void)
            | (StaticType::Unknown, StaticType::Unknown)
            | (StaticType::EmptyList, StaticType::EmptyList)
            | (StaticType::Range, StaticType::Range) => true,
            (StaticType::List(left), StaticType::List(right)) => left == right,
            (StaticType::Map(left), StaticType::Map(right)) => left == right,
            (StaticType::Struct(left), StaticType::Struct(right)) => left.name == right.name,
            (StaticType::Enum(left), StaticType::Enum(right)) => left.name == right.name,
            (StaticType::Function(left), StaticType::Function(right)) => {
                left.return_type == right.return_type
                    && left.parameters.len() == right.parameters.len()
                    && left
                        .parameters
                        .iter()
                        .zip(&right.parameters)
                        .all(|((_, a), (_, b))| a == b)
            }
            _ => false,
        }
    }
}

impl StaticType {
    /// Resolves a primitive type token.
    pub fn from_primitive(name: &str) -> Option<Self> {
        match name {
            "Num" => Some(StaticType::Num),
            "Str" => Some(StaticType::Str),
            "Bool" => Some(StaticType::Bool),
            "Void" => Some(StaticType::Void),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StaticType::Num => "Num".to_string(),
            StaticType::Str => "Str".to_string(),
            StaticType::Bool => "Bool".to_string(),
            StaticType::Void => "Void".to_string(),
            StaticType::Unknown => "Unknown".to_string(),
            StaticType::EmptyList => "[]".to_string(),
            StaticType::List(inner) => format!("[{}]", inner.describe()),
            StaticType::Map(value) => format!("[Str:{}]", value.describe()),
            StaticType::Range => "Range".to_string(),
            StaticType::Struct(struct_type) => struct_type.name.clone(),
            StaticType::Enum(enum_type) => enum_type.name.clone(),
            StaticType::Function(function) => {
                let params = function
                    .parameters
                    .iter()
                    .map(|(_, ty)| ty.describe())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("fn({params}) {}", function.return_type.describe())
            }
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, StaticType::Unknown)
    }

    /// True when `Unknown` appears anywhere in the type, e.g. the `[Str:Unknown]`
    /// of an empty map literal.
    pub fn contains_unknown(&self) -> bool {
        match self {
            StaticType::Unknown => true,
            StaticType::List(inner) | StaticType::Map(inner) => inner.contains_unknown(),
            _ => false,
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// The type of a literal CST node, keyed by its grammar name.
pub fn literal_type(kind: &str) -> Option<StaticType> {
    match kind {
        "string" | "interpolated_string" => Some(StaticType::Str),
        "number" => Some(StaticType::Num),
        "boolean" => Some(StaticType::Bool),
        _ => None,
    }
}

pub fn compatible(a: &StaticType, b: &StaticType) -> bool {
    match (a, b) {
        (StaticType::Unknown, _) | (_, StaticType::Unknown) => false,
        (StaticType::EmptyList, StaticType::List(_) | StaticType::EmptyList)
        | (StaticType::List(_), StaticType::EmptyList) => true,
        _ => a == b,
    }
}

pub fn is_iterable(ty: &StaticType) -> bool {
    matches!(
        ty,
        StaticType::Num
            | StaticType::Str
            | StaticType::Range
            | StaticType::List(_)
            | StaticType::EmptyList
    )
}

/// A parameter or return type in a member signature, relative to the value
/// the member is looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    Num,
    Str,
    Bool,
    Void,
    /// The element type of a list or the value type of a map.
    Element,
    /// The type of the value the member was looked up on.
    Receiver,
}

impl MemberType {
    pub fn resolve(self, receiver: &StaticType) -> StaticType {
        match self {
            MemberType::Num => StaticType::Num,
            MemberType::Str => StaticType::Str,
            MemberType::Bool => StaticType::Bool,
            MemberType::Void => StaticType::Void,
            MemberType::Element => match receiver {
                StaticType::List(inner) | StaticType::Map(inner) => (**inner).clone(),
                StaticType::Str => StaticType::Str,
                _ => StaticType::Unknown,
            },
            MemberType::Receiver => receiver.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemberSignature {
    pub mutates: bool,
    pub callable: bool,
    pub parameters: &'static [MemberType],
    pub return_type: MemberType,
}

const fn property(return_type: MemberType) -> MemberSignature {
    MemberSignature {
        mutates: false,
        callable: false,
        parameters: &[],
        return_type,
    }
}

const fn method(parameters: &'static [MemberType], return_type: MemberType) -> MemberSignature {
    MemberSignature {
        mutates: false,
        callable: true,
        parameters,
        return_type,
    }
}

const fn mutating(parameters: &'static [MemberType], return_type: MemberType) -> MemberSignature {
    MemberSignature {
        mutates: true,
        callable: true,
        parameters,
        return_type,
    }
}

pub static LIST_MEMBERS: &[(&str, MemberSignature)] = &[
    ("length", property(MemberType::Num)),
    ("at", method(&[MemberType::Num], MemberType::Element)),
    ("push", mutating(&[MemberType::Element], MemberType::Num)),
    ("pop", mutating(&[], MemberType::Element)),
    ("reverse", mutating(&[], MemberType::Receiver)),
    ("includes", method(&[MemberType::Element], MemberType::Bool)),
];

pub static MAP_MEMBERS: &[(&str, MemberSignature)] = &[
    ("size", property(MemberType::Num)),
    ("get", method(&[MemberType::Str], MemberType::Element)),
    (
        "set",
        mutating(&[MemberType::Str, MemberType::Element], MemberType::Receiver),
    ),
    ("has", method(&[MemberType::Str], MemberType::Bool)),
    ("delete", mutating(&[MemberType::Str], MemberType::Bool)),
];

pub static STR_MEMBERS: &[(&str, MemberSignature)] = &[
    ("length", property(MemberType::Num)),
    ("at", method(&[MemberType::Num], MemberType::Str)),
    ("includes", method(&[MemberType::Str], MemberType::Bool)),
    ("trim", method(&[], MemberType::Str)),
];

/// The member table for a receiver type, if the type has one.
pub fn member_table(receiver: &StaticType) -> Option<&'static [(&'static str, MemberSignature)]> {
    match receiver {
        StaticType::List(_) | StaticType::EmptyList => Some(LIST_MEMBERS),
        StaticType::Map(_) => Some(MAP_MEMBERS),
        StaticType::Str => Some(STR_MEMBERS),
        _ => None,
    }
}

pub fn lookup_member(receiver: &StaticType, name: &str) -> Option<&'static MemberSignature> {
    member_table(receiver)?
        .iter()
        .find(|(member, _)| *member == name)
        .map(|(_, signature)| signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(inner: StaticType) -> StaticType {
        StaticType::List(Box::new(inner))
    }

    #[test]
    fn describes_compound_types() {
        assert_eq!(list(StaticType::Num).to_string(), "[Num]");
        assert_eq!(
            StaticType::Map(Box::new(list(StaticType::Str))).to_string(),
            "[Str:[Str]]"
        );
        let function = FunctionType::new(
            vec![("x".into(), StaticType::Num), ("y".into(), StaticType::Num)],
            StaticType::Num,
        );
        assert_eq!(
            StaticType::Function(function).to_string(),
            "fn(Num, Num) Num"
        );
    }

    #[test]
    fn unknown_is_never_compatible() {
        assert!(!compatible(&StaticType::Unknown, &StaticType::Unknown));
        assert!(!compatible(&StaticType::Unknown, &StaticType::Num));
        assert!(!compatible(&StaticType::Str, &StaticType::Unknown));
    }

    #[test]
    fn finds_nested_unknowns() {
        assert!(StaticType::Map(Box::new(StaticType::Unknown)).contains_unknown());
        assert!(list(list(StaticType::Unknown)).contains_unknown());
        assert!(!list(StaticType::Num).contains_unknown());
        assert!(!StaticType::EmptyList.contains_unknown());
    }

    #[test]
    fn structs_compare_by_name() {
        let a = StaticType::Struct(StructType::new("Person", vec![]));
        let b = StaticType::Struct(StructType::new(
            "Person",
            vec![("name".into(), StaticType::Str)],
        ));
        let c = StaticType::Struct(StructType::new("Pet", vec![]));
        assert!(compatible(&a, &b));
        assert!(!compatible(&a, &c));
    }

    #[test]
    fn function_equality_ignores_parameter_names() {
        let a = FunctionType::new(vec![("a".into(), StaticType::Num)], StaticType::Str);
        let b = FunctionType::new(vec![("b".into(), StaticType::Num)], StaticType::Str);
        assert_eq!(StaticType::Function(a), StaticType::Function(b));
    }

    #[test]
    fn iterable_types() {
        assert!(is_iterable(&StaticType::Num));
        assert!(is_iterable(&StaticType::Str));
        assert!(is_iterable(&list(StaticType::Bool)));
        assert!(!is_iterable(&StaticType::Bool));
        assert!(!is_iterable(&StaticType::Map(Box::new(StaticType::Num))));
    }

    #[test]
    fn resolves_member_signatures_against_the_receiver() {
        let receiver = list(StaticType::Str);
        let push = lookup_member(&receiver, "push").expect("push is a list member");
        assert!(push.mutates && push.callable);
        assert_eq!(push.parameters[0].resolve(&receiver), StaticType::Str);

        let map = StaticType::Map(Box::new(StaticType::Num));
        let get = lookup_member(&map, "get").expect("get is a map member");
        assert_eq!(get.return_type.resolve(&map), StaticType::Num);

        assert!(lookup_member(&StaticType::Str, "push").is_none());
        assert!(lookup_member(&StaticType::Bool, "length").is_none());
    }
}
