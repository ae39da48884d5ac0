//! Static type descriptions used in place of runtime reflection.
//!
//! Every payload type that appears in a document implements [`Reflect`],
//! returning a [`TypeDescriptor`]. Element and field types are stored as
//! `fn() -> TypeDescriptor` pointers so that self-referential types can be
//! described without building an infinite value.
//!
//! ```
//! use swagdoc::reflect::{FieldDescriptor, Reflect, TypeDescriptor};
//!
//! struct Product {
//!     id: u64,
//!     tags: Vec<String>,
//! }
//!
//! impl Reflect for Product {
//!     fn type_descriptor() -> TypeDescriptor {
//!         TypeDescriptor::structure(
//!             "models.Product",
//!             vec![
//!                 FieldDescriptor::of::<u64>("ID").tag(r#"json:"id" example:"1""#),
//!                 FieldDescriptor::of::<Vec<String>>("Tags").tag(r#"json:"tags""#),
//!             ],
//!         )
//!     }
//! }
//! ```

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::{mpsc, Arc};

use crate::tags::FieldTags;

static TYPE_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[A-Za-z_][A-Za-z0-9_]*::)*([A-Za-z_][A-Za-z0-9_]*)::([A-Za-z_][A-Za-z0-9_]*)")
        .unwrap()
});

/// Lazily evaluated type description
pub type TypeFn = fn() -> TypeDescriptor;

/// A type that can describe its own shape for schema generation
pub trait Reflect {
    fn type_descriptor() -> TypeDescriptor;
}

/// Scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    String,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Char => "char",
            Primitive::String => "string",
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            Primitive::Bool | Primitive::F32 | Primitive::F64 | Primitive::Char | Primitive::String
        )
    }
}

/// Struct types that render as scalars or get unwrapped instead of becoming definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnown {
    Timestamp,
    Date,
    Duration,
    /// Container whose `Model` field holds the real payload
    ResponseWrapper,
}

#[derive(Debug, Clone)]
pub struct StructShape {
    pub fields: Vec<FieldDescriptor>,
    pub well_known: Option<WellKnown>,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declared field name, used when no json name is tagged
    pub name: String,
    pub ty: TypeFn,
    pub tags: FieldTags,
    /// Anonymous member whose fields are promoted into the owner
    pub embedded: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, ty: TypeFn) -> Self {
        Self {
            name: name.to_string(),
            ty,
            tags: FieldTags::default(),
            embedded: false,
        }
    }

    pub fn of<T: Reflect>(name: &str) -> Self {
        Self::new(name, T::type_descriptor)
    }

    /// Embedded member of type `T`; its fields are flattened into the owner
    pub fn embed<T: Reflect>() -> Self {
        let descriptor = T::type_descriptor();
        let name = descriptor
            .name
            .as_deref()
            .and_then(|n| n.rsplit('.').next())
            .unwrap_or("Embedded")
            .to_string();
        Self {
            embedded: true,
            ..Self::new(&name, T::type_descriptor)
        }
    }

    /// Attach tags from their textual form; malformed text is logged and ignored
    pub fn tag(mut self, raw: &str) -> Self {
        match FieldTags::parse(raw) {
            Ok(tags) => self.tags = tags,
            Err(e) => warn!("Ignoring tags on field {}: {}", self.name, e),
        }
        self
    }

    pub fn tags(mut self, tags: FieldTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        (self.ty)()
    }
}

#[derive(Debug, Clone)]
pub enum Kind {
    Primitive(Primitive),
    Struct(StructShape),
    Slice(TypeFn),
    Array(TypeFn, usize),
    Map { key: TypeFn, value: TypeFn },
    Pointer(TypeFn),
    Interface,
    File,
    Func,
    Chan,
}

/// Shape of one type: an optional defining name plus its kind
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Defining name such as `models.Product`; `None` for anonymous types
    pub name: Option<String>,
    pub kind: Kind,
}

impl TypeDescriptor {
    pub fn new(name: Option<String>, kind: Kind) -> Self {
        Self { name, kind }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::new(
            Some(primitive.name().to_string()),
            Kind::Primitive(primitive),
        )
    }

    pub fn structure(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(
            Some(name.into()),
            Kind::Struct(StructShape {
                fields,
                well_known: None,
            }),
        )
    }

    pub fn well_known(name: impl Into<String>, well_known: WellKnown) -> Self {
        Self::new(
            Some(name.into()),
            Kind::Struct(StructShape {
                fields: Vec::new(),
                well_known: Some(well_known),
            }),
        )
    }

    /// Wrapper struct; definition and response generation use its `Model` field
    pub fn wrapper(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(
            Some(name.into()),
            Kind::Struct(StructShape {
                fields,
                well_known: Some(WellKnown::ResponseWrapper),
            }),
        )
    }

    pub fn slice<T: Reflect>() -> Self {
        Self::new(None, Kind::Slice(T::type_descriptor))
    }

    pub fn array<T: Reflect>(len: usize) -> Self {
        Self::new(None, Kind::Array(T::type_descriptor, len))
    }

    pub fn map<K: Reflect, V: Reflect>() -> Self {
        Self::new(
            None,
            Kind::Map {
                key: K::type_descriptor,
                value: V::type_descriptor,
            },
        )
    }

    pub fn pointer<T: Reflect>() -> Self {
        Self::new(None, Kind::Pointer(T::type_descriptor))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defining name, or a structural rendering for anonymous types
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.kind {
            Kind::Primitive(p) => p.name().to_string(),
            Kind::Struct(shape) => {
                let fields: Vec<String> = shape
                    .fields
                    .iter()
                    .map(|f| format!("{} {}", f.name, f.descriptor().display_name()))
                    .collect();
                format!("struct {{ {} }}", fields.join("; "))
            }
            Kind::Slice(elem) => format!("[]{}", elem().display_name()),
            Kind::Array(elem, len) => format!("[{}]{}", len, elem().display_name()),
            Kind::Map { key, value } => {
                format!("map[{}]{}", key().display_name(), value().display_name())
            }
            Kind::Pointer(inner) => format!("*{}", inner().display_name()),
            Kind::Interface => "interface {}".to_string(),
            Kind::File => "file".to_string(),
            Kind::Func => "func".to_string(),
            Kind::Chan => "chan".to_string(),
        }
    }

    pub fn struct_shape(&self) -> Option<&StructShape> {
        match &self.kind {
            Kind::Struct(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn well_known_kind(&self) -> Option<WellKnown> {
        self.struct_shape().and_then(|s| s.well_known)
    }

    /// Struct that becomes its own definition (not a scalar, not a wrapper)
    pub fn is_plain_struct(&self) -> bool {
        matches!(self.struct_shape(), Some(shape) if shape.well_known.is_none())
    }

    /// Follow pointer layers down to the pointee
    pub fn deref(self) -> TypeDescriptor {
        let mut current = self;
        while let Kind::Pointer(inner) = current.kind {
            current = inner();
        }
        current
    }

    /// Element type of a slice or array
    pub fn element(&self) -> Option<TypeDescriptor> {
        match &self.kind {
            Kind::Slice(elem) | Kind::Array(elem, _) => Some(elem()),
            _ => None,
        }
    }

    /// The `Model` field of a response wrapper
    pub fn wrapped_model(&self) -> Option<TypeDescriptor> {
        let shape = self.struct_shape()?;
        if shape.well_known != Some(WellKnown::ResponseWrapper) {
            return None;
        }
        shape
            .fields
            .iter()
            .find(|f| f.name == "Model")
            .map(FieldDescriptor::descriptor)
    }
}

/// `module.Type` form of a Rust type path, e.g. `app::models::Product` becomes `models.Product`
pub fn qualified_name<T: ?Sized>() -> String {
    shorten_type_path(std::any::type_name::<T>())
}

pub fn shorten_type_path(raw: &str) -> String {
    TYPE_PATH_REGEX.replace_all(raw, "$1.$2").into_owned()
}

macro_rules! reflect_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive(Primitive::$variant)
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
}

impl<'a> Reflect for &'a str {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive(Primitive::String)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::slice::<T>()
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::slice::<T>()
    }
}

impl<T: Reflect> Reflect for HashSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::slice::<T>()
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::slice::<T>()
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::array::<T>(N)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::pointer::<T>()
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::pointer::<T>()
    }
}

impl<T: Reflect> Reflect for Rc<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::pointer::<T>()
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::pointer::<T>()
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map::<K, V>()
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map::<K, V>()
    }
}

impl Reflect for serde_json::Value {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(None, Kind::Interface)
    }
}

impl Reflect for std::time::SystemTime {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::well_known("time.SystemTime", WellKnown::Timestamp)
    }
}

impl Reflect for std::time::Duration {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::well_known("time.Duration", WellKnown::Duration)
    }
}

impl<Tz: chrono::TimeZone> Reflect for chrono::DateTime<Tz> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::well_known("chrono.DateTime", WellKnown::Timestamp)
    }
}

impl Reflect for chrono::NaiveDateTime {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::well_known("chrono.NaiveDateTime", WellKnown::Timestamp)
    }
}

impl Reflect for chrono::NaiveDate {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::well_known("chrono.NaiveDate", WellKnown::Date)
    }
}

impl Reflect for chrono::Duration {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::well_known("chrono.Duration", WellKnown::Duration)
    }
}

impl<T> Reflect for mpsc::Sender<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(None, Kind::Chan)
    }
}

impl<T> Reflect for mpsc::SyncSender<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(None, Kind::Chan)
    }
}

impl<T> Reflect for mpsc::Receiver<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(None, Kind::Chan)
    }
}

impl<R> Reflect for fn() -> R {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(None, Kind::Func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Reflect for Node {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Node",
                vec![
                    FieldDescriptor::of::<Vec<Node>>("Children"),
                    FieldDescriptor::of::<Option<Box<Node>>>("Parent"),
                ],
            )
        }
    }

    #[test]
    fn test_self_referential_descriptor_is_lazy() {
        let node = Node::type_descriptor();
        let shape = node.struct_shape().unwrap();
        assert_eq!(shape.fields.len(), 2);

        let children = shape.fields[0].descriptor();
        assert_eq!(children.display_name(), "[]models.Node");

        let parent = shape.fields[1].descriptor().deref();
        assert_eq!(parent.name.as_deref(), Some("models.Node"));
    }

    #[test]
    fn test_anonymous_display_names() {
        assert_eq!(
            <HashMap<String, Vec<u8>>>::type_descriptor().display_name(),
            "map[string][]u8"
        );
        assert_eq!(<[i32; 3]>::type_descriptor().display_name(), "[3]i32");
        assert_eq!(<Option<bool>>::type_descriptor().display_name(), "*bool");
    }

    #[test]
    fn test_shorten_type_path() {
        assert_eq!(shorten_type_path("app::models::Product"), "models.Product");
        assert_eq!(shorten_type_path("app::Product"), "app.Product");
        assert_eq!(
            shorten_type_path("swagdoc::model::CustomResponse<app::models::Product>"),
            "model.CustomResponse<models.Product>"
        );
        assert_eq!(shorten_type_path("u64"), "u64");
    }

    #[test]
    fn test_embed_uses_short_type_name() {
        let field = FieldDescriptor::embed::<Node>();
        assert!(field.embedded);
        assert_eq!(field.name, "Node");
    }

    #[test]
    fn test_malformed_tag_is_ignored() {
        let field = FieldDescriptor::of::<u64>("ID").tag("json:broken");
        assert!(field.tags.is_empty());
    }
}
