use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use base64::Engine;

use crate::options::{OptionValue, Options};

/// Declarative metadata of one source field.
///
/// Attached at schema-definition time (usually by `#[hub(...)]` on a
/// `#[derive(Describable)]` struct) and immutable afterwards.
///
/// - `target`: canonical slot, dotted for nested slots (`degree_info.institution`).
///   Empty → the value lands in `Record::extra`.
/// - Sub-target selectors (`date_type`, `identifier_type`, `role`, ...)
///   qualify collection targets.
/// - `parser` / `validators`: registry names; `validators` is a comma list.
/// - `priority`: opts the field into the priority merge for its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAnnotation {
    pub target: &'static str,
    pub date_type: Option<&'static str>,
    pub identifier_type: Option<&'static str>,
    pub role: Option<&'static str>,
    pub contributor_type: Option<&'static str>,
    pub subject_vocabulary: Option<&'static str>,
    pub relation_type: Option<&'static str>,
    pub parser: Option<&'static str>,
    pub validators: Option<&'static str>,
    pub pattern: Option<&'static str>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_count: Option<u64>,
    pub max_count: Option<u64>,
    pub delimiter: Option<&'static str>,
    pub required: bool,
    pub priority: Option<i32>,
    pub description: Option<&'static str>,
}

impl FieldAnnotation {
    pub const EMPTY: FieldAnnotation = FieldAnnotation {
        target: "",
        date_type: None,
        identifier_type: None,
        role: None,
        contributor_type: None,
        subject_vocabulary: None,
        relation_type: None,
        parser: None,
        validators: None,
        pattern: None,
        min_length: None,
        max_length: None,
        min_value: None,
        max_value: None,
        min_count: None,
        max_count: None,
        delimiter: None,
        required: false,
        priority: None,
        description: None,
    };

    pub const fn new(target: &'static str) -> Self {
        Self {
            target,
            ..Self::EMPTY
        }
    }

    /// The selector that distinguishes logically separate slots of one target.
    pub fn sub_type(&self) -> Option<&'static str> {
        self.date_type
            .or(self.identifier_type)
            .or(self.role)
            .or(self.contributor_type)
            .or(self.subject_vocabulary)
            .or(self.relation_type)
    }

    /// Names listed in `validators`, trimmed, empty entries skipped.
    pub fn validator_names(&self) -> impl Iterator<Item = &'static str> {
        split_rules(self.validators.unwrap_or(""))
    }

    /// Generic validators implied by the declared constraints.
    pub fn implied_validators(&self) -> Vec<&'static str> {
        let mut rules = Vec::new();
        if self.pattern.is_some() {
            rules.push("pattern");
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            rules.push("length");
        }
        if self.min_value.is_some() || self.max_value.is_some() {
            rules.push("range");
        }
        if self.min_count.is_some() || self.max_count.is_some() {
            rules.push("count");
        }
        rules
    }

    /// Constraint and hint values as an [`Options`] bag.
    pub fn options(&self) -> Options {
        let mut options = Options::new();
        let strs = [
            ("pattern", self.pattern),
            ("delimiter", self.delimiter),
            ("date_type", self.date_type),
            ("identifier_type", self.identifier_type),
            ("role", self.role),
        ];
        for (name, value) in strs {
            if let Some(v) = value {
                options.set(name, OptionValue::Str(v.to_string()));
            }
        }
        let counts = [
            ("min_length", self.min_length),
            ("max_length", self.max_length),
            ("min_count", self.min_count),
            ("max_count", self.max_count),
        ];
        for (name, value) in counts {
            if let Some(v) = value {
                options.set(name, OptionValue::U64(v));
            }
        }
        for (name, value) in [("min_value", self.min_value), ("max_value", self.max_value)] {
            if let Some(v) = value {
                options.set(name, OptionValue::F64(v));
            }
        }
        options
    }
}

/// Split a comma-separated rule list.
pub fn split_rules(rules: &str) -> impl Iterator<Item = &str> {
    rules.split(',').map(str::trim).filter(|r| !r.is_empty())
}

/// Message-level annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAnnotation {
    /// Canonical target of the whole message. Only `"Record"` converts.
    pub target: &'static str,
    /// Keep unannotated fields in `Record::extra`.
    pub preserve_unmapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// `None` → unmapped field.
    pub annotation: Option<FieldAnnotation>,
}

/// Static description of a source schema: identity, message annotation and
/// fields in declaration order. Field position is the index passed to
/// [`Describable::field_value`].
#[derive(Debug)]
pub struct MessageDescriptor {
    pub full_name: &'static str,
    pub annotation: Option<MessageAnnotation>,
    pub fields: &'static [FieldDescriptor],
}

impl MessageDescriptor {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn preserve_unmapped(&self) -> bool {
        self.annotation.is_some_and(|a| a.preserve_unmapped)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Annotation of one enum constant: one constant maps to one canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValueAnnotation {
    pub ordinal: i32,
    pub name: &'static str,
    pub target: Option<&'static str>,
}

/// Reflected enum value: type identity, ordinal, and the type's value table.
#[derive(Debug, Clone, Copy)]
pub struct EnumRef {
    pub type_name: &'static str,
    pub ordinal: i32,
    pub values: &'static [EnumValueAnnotation],
}

impl EnumRef {
    pub fn annotation(&self) -> Option<&'static EnumValueAnnotation> {
        self.values.iter().find(|v| v.ordinal == self.ordinal)
    }

    /// Canonical name declared for this constant, if any.
    pub fn target(&self) -> Option<&'static str> {
        self.annotation().and_then(|a| a.target)
    }

    /// Constant name as declared in the source schema.
    pub fn name(&self) -> Option<&'static str> {
        self.annotation().map(|a| a.name)
    }
}

/// Enum types that can appear as annotated source fields.
/// Implemented by `#[derive(HubEnum)]`.
pub trait HubEnum {
    const TYPE_NAME: &'static str;

    fn values() -> &'static [EnumValueAnnotation];

    fn ordinal(&self) -> i32;

    fn enum_ref(&self) -> EnumRef {
        EnumRef {
            type_name: Self::TYPE_NAME,
            ordinal: self.ordinal(),
            values: Self::values(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reflection
// ---------------------------------------------------------------------------

/// Reflected handle of a present field value.
#[derive(Clone)]
pub enum FieldValue<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
    Enum(EnumRef),
    Message(&'a dyn Describable),
    List(Vec<FieldValue<'a>>),
    Map(Vec<(String, FieldValue<'a>)>),
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "Bool({v})"),
            FieldValue::Int(v) => write!(f, "Int({v})"),
            FieldValue::UInt(v) => write!(f, "UInt({v})"),
            FieldValue::Float(v) => write!(f, "Float({v})"),
            FieldValue::Str(v) => write!(f, "Str({v:?})"),
            FieldValue::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            FieldValue::Enum(e) => write!(f, "Enum({}#{})", e.type_name, e.ordinal),
            FieldValue::Message(m) => write!(f, "Message({})", m.descriptor().full_name),
            FieldValue::List(items) => f.debug_list().entries(items).finish(),
            FieldValue::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
        }
    }
}

impl FieldValue<'_> {
    /// Raw JSON rendering, used for values kept in `Record::extra`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Bool(v) => serde_json::Value::Bool(*v),
            FieldValue::Int(v) => serde_json::json!(v),
            FieldValue::UInt(v) => serde_json::json!(v),
            FieldValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Str(s) => serde_json::Value::String(s.to_string()),
            FieldValue::Bytes(b) => {
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            FieldValue::Enum(e) => match e.name() {
                Some(name) => serde_json::Value::String(name.to_string()),
                None => serde_json::json!(e.ordinal),
            },
            FieldValue::Message(m) => message_to_json(*m),
            FieldValue::List(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json).collect())
            }
            FieldValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Object of a message's present fields.
pub fn message_to_json(message: &dyn Describable) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = message
        .descriptor()
        .fields
        .iter()
        .enumerate()
        .filter_map(|(i, f)| message.field_value(i).map(|v| (f.name.to_string(), v.to_json())))
        .collect();
    serde_json::Value::Object(map)
}

/// A source schema the engine can walk generically.
///
/// Three capabilities: enumerable fields with presence checks
/// ([`field_value`](Self::field_value) returns `None` for an absent field),
/// per-field declarative metadata ([`descriptor`](Self::descriptor)), and
/// typed value extraction ([`FieldValue`]).
///
/// Implemented by `#[derive(Describable)]`.
pub trait Describable: Any {
    /// Descriptor of the implementing type.
    fn schema() -> &'static MessageDescriptor
    where
        Self: Sized;

    /// Descriptor of the runtime type.
    fn descriptor(&self) -> &'static MessageDescriptor;

    /// Value of the field at `index`, `None` when the field has no presence.
    fn field_value(&self, index: usize) -> Option<FieldValue<'_>>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Describable + '_ {
    pub fn full_name(&self) -> &'static str {
        self.descriptor().full_name
    }

    /// Value of a field looked up by name.
    pub fn get(&self, name: &str) -> Option<FieldValue<'_>> {
        self.descriptor()
            .field_index(name)
            .and_then(|i| self.field_value(i))
    }

    pub fn downcast_ref<T: Describable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Describable + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// Typed value extraction for one field type. `None` means no presence.
///
/// Presence rules: `Option::None`, an empty `String` and an empty
/// collection have none; numbers and booleans are always present.
pub trait Reflect {
    fn reflect(&self) -> Option<FieldValue<'_>>;
}

impl Reflect for String {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        (!self.is_empty()).then_some(FieldValue::Str(self))
    }
}

impl Reflect for bool {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        Some(FieldValue::Bool(*self))
    }
}

macro_rules! reflect_int {
    ($variant:ident as $wide:ty: $($ty:ty),+) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> Option<FieldValue<'_>> {
                    Some(FieldValue::$variant(<$wide>::from(*self)))
                }
            }
        )+
    };
}

reflect_int!(Int as i64: i8, i16, i32, i64);
reflect_int!(UInt as u64: u8, u16, u32, u64);
reflect_int!(Float as f64: f32, f64);

impl Reflect for Box<[u8]> {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        (!self.is_empty()).then_some(FieldValue::Bytes(self))
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        self.as_ref().and_then(Reflect::reflect)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        (**self).reflect()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        let items: Vec<FieldValue<'_>> = self.iter().filter_map(Reflect::reflect).collect();
        (!items.is_empty()).then_some(FieldValue::List(items))
    }
}

impl<T: Reflect> Reflect for BTreeMap<String, T> {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        let entries: Vec<(String, FieldValue<'_>)> = self
            .iter()
            .filter_map(|(k, v)| v.reflect().map(|v| (k.clone(), v)))
            .collect();
        (!entries.is_empty()).then_some(FieldValue::Map(entries))
    }
}

impl<T: Reflect, S> Reflect for HashMap<String, T, S> {
    fn reflect(&self) -> Option<FieldValue<'_>> {
        // Sorted so repeated conversions are deterministic.
        let mut entries: Vec<(String, FieldValue<'_>)> = self
            .iter()
            .filter_map(|(k, v)| v.reflect().map(|v| (k.clone(), v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        (!entries.is_empty()).then_some(FieldValue::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_rules() {
        assert!(String::new().reflect().is_none());
        assert!(matches!("x".to_string().reflect(), Some(FieldValue::Str("x"))));
        assert!(matches!(0i32.reflect(), Some(FieldValue::Int(0))));
        assert!(None::<i64>.reflect().is_none());
        assert!(Vec::<String>::new().reflect().is_none());
        assert!(vec![String::new()].reflect().is_none());
        match vec!["a".to_string(), String::new(), "b".to_string()].reflect() {
            Some(FieldValue::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn hash_map_entries_are_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2u32);
        map.insert("a".to_string(), 1u32);
        let json = map.reflect().unwrap().to_json();
        assert_eq!(json.to_string(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn annotation_options_and_implied_rules() {
        let annotation = FieldAnnotation {
            pattern: Some("^[0-9]+$"),
            max_length: Some(10),
            min_count: Some(1),
            delimiter: Some(","),
            validators: Some("isbn, ,required"),
            ..FieldAnnotation::new("identifiers")
        };
        assert_eq!(
            annotation.validator_names().collect::<Vec<_>>(),
            vec!["isbn", "required"]
        );
        assert_eq!(annotation.implied_validators(), vec!["pattern", "length", "count"]);
        let options = annotation.options();
        assert_eq!(options.get_str("pattern"), Some("^[0-9]+$"));
        assert_eq!(options.get_u64("max_length"), Some(10));
        assert_eq!(options.get_str("delimiter"), Some(","));
    }

    #[test]
    fn sub_type_prefers_declared_selector() {
        let annotation = FieldAnnotation {
            date_type: Some("issued"),
            ..FieldAnnotation::new("dates")
        };
        assert_eq!(annotation.sub_type(), Some("issued"));
        assert_eq!(FieldAnnotation::new("title").sub_type(), None);
        let organizations = FieldAnnotation {
            contributor_type: Some("organization"),
            ..FieldAnnotation::new("contributors")
        };
        assert_eq!(organizations.sub_type(), Some("organization"));
    }
}
